pub mod simulation_clock;

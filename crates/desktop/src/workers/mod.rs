pub mod encode_worker;

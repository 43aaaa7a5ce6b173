pub mod commit;
pub mod context;
pub mod gate;

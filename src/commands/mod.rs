pub mod keygen;
pub mod list;
pub mod run;

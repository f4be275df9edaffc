pub mod recorder;
mod settle;

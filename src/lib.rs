
pub mod core {
    pub mod config;
    pub mod error;
    pub mod model;
    pub mod style;
}


pub mod reporters;

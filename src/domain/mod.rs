// Domain layer - Core business models and rules
pub mod frame;
pub mod selection;
pub mod timestep;
pub mod view;
pub mod zoom;

mod optimizer;

pub use optimizer::*;

mod dense;

pub use dense::Layer as Dense;

/// Slope of [`leaky_relu`] for negative inputs.
pub const LEAKY_ALPHA: f64 = 0.2;

pub fn relu(x: f64) -> f64 {
    if x < 0. {
        return 0.;
    }
    x
}

pub fn leaky_relu(x: f64) -> f64 {
    if x < 0. {
        return LEAKY_ALPHA * x;
    }
    x
}

pub fn sigmoid(x: f64) -> f64 {
    1. / (1. + (-x).exp())
}

//! Train a small feedforward network on a toy dataset and watch it learn.
//!
//! A [`config::Form`] is validated into a [`config::TrainConfig`], a
//! [`run::Session`] starts a [`run::Run`] for it, and every epoch the
//! [`render::FrameRenderer`] repaints the decision boundary (or regression
//! line) and the loss curve onto 2D [`render::Surface`]s.

mod activation;
pub mod config;
pub mod data;
mod error;
pub mod f;
pub mod layers;
mod loss;
pub mod nn;
pub mod optimizers;
pub mod render;
pub mod run;
pub mod util;

pub use activation::{Activation, Activations};
pub use error::{Error, Result};
pub use loss::{Loss, Losses};
pub use optimizers::Optimizers;

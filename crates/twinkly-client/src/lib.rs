//! Client for the HTTP control protocol spoken by Twinkly LED controllers.
//!
//! A [`Session`] logs in to one device and then issues authorized calls on
//! its behalf. A [`Movie`] is a sequence of [`Frame`]s that encodes to the
//! flat RGB buffer the device plays back.
//!
//! ```no_run
//! use twinkly_client::{DeviceMode, Frame, Movie, Pixel, Session};
//!
//! # async fn run() -> twinkly_client::Result<()> {
//! let session = Session::connect("192.168.1.160").await?;
//!
//! let mut frame = Frame::new(600);
//! frame.fill(Pixel::new(255, 0, 0));
//! let movie = Movie::with_frames(600, 500, [frame])?;
//!
//! session.upload_movie(&movie).await?;
//! session.set_mode(DeviceMode::Movie).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mode;
pub mod movie;
pub mod session;
pub mod transport;

pub use error::{Result, TwinklyError};
pub use mode::DeviceMode;
pub use movie::{Frame, Movie, MovieConfig, Pixel};
pub use session::Session;
pub use transport::{
    DeviceRequest, DeviceResponse, DeviceTransport, HttpTransport, TransportConfig,
};

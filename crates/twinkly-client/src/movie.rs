//! In-memory movie model and its binary encoding.
//!
//! The device expects a movie as one flat buffer of RGB triples, frame after
//! frame, with no delimiters. Frame boundaries are conveyed separately through
//! [`MovieConfig`].

use crate::error::{Result, TwinklyError};
use serde::Serialize;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Bytes per encoded pixel (R, G, B).
pub const BYTES_PER_PIXEL: usize = 3;

/// One LED's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Saturates each channel into 0..=255.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        let clamp = |v: i32| v.clamp(0, u8::MAX as i32) as u8;
        Self::new(clamp(r), clamp(g), clamp(b))
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; BYTES_PER_PIXEL] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Pixel {
    type Err = TwinklyError;

    /// Parses `r,g,b` with each channel in 0..=255.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TwinklyError::InvalidPixel(s.to_string());
        let channels = s
            .split(',')
            .map(|part| part.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match channels.as_slice() {
            [r, g, b] => Ok(Pixel::new(*r, *g, *b)),
            _ => Err(invalid()),
        }
    }
}

/// A full-strand snapshot: exactly one pixel per LED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[Pixel]>,
}

impl Frame {
    /// Creates a frame of `led_count` black pixels.
    pub fn new(led_count: usize) -> Self {
        Self {
            pixels: vec![Pixel::BLACK; led_count].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Mutable view of the pixels. The frame length cannot change through it.
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn get(&self, index: usize) -> Option<Pixel> {
        self.pixels.get(index).copied()
    }

    /// Sets one pixel; returns `false` when `index` is past the end.
    pub fn set(&mut self, index: usize, color: Pixel) -> bool {
        match self.pixels.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, color: Pixel) {
        self.pixels.fill(color);
    }

    /// `3 * len()` bytes, pixels in index order, channels in R, G, B order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buffer);
        buffer
    }

    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(self.encoded_len());
        for pixel in self.pixels.iter() {
            buffer.extend_from_slice(&pixel.to_bytes());
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.pixels.len() * BYTES_PER_PIXEL
    }
}

impl Index<usize> for Frame {
    type Output = Pixel;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pixels[index]
    }
}

impl IndexMut<usize> for Frame {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.pixels[index]
    }
}

/// Body of the `led/movie/config` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovieConfig {
    pub leds_number: usize,
    pub frames_number: usize,
    pub frame_delay: u32,
}

/// Ordered frames plus playback timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    led_count: usize,
    frame_delay: u32,
    frames: Vec<Frame>,
}

impl Movie {
    /// `frame_delay` is the interval between frames in device units (milliseconds).
    pub fn new(led_count: usize, frame_delay: u32) -> Self {
        Self {
            led_count,
            frame_delay,
            frames: Vec::new(),
        }
    }

    pub fn with_frames(
        led_count: usize,
        frame_delay: u32,
        frames: impl IntoIterator<Item = Frame>,
    ) -> Result<Self> {
        let mut movie = Self::new(led_count, frame_delay);
        for frame in frames {
            movie.push_frame(frame)?;
        }
        Ok(movie)
    }

    /// Appends a frame, rejecting one whose length differs from `led_count`.
    pub fn push_frame(&mut self, frame: Frame) -> Result<()> {
        if frame.len() != self.led_count {
            return Err(TwinklyError::FrameLength {
                expected: self.led_count,
                actual: frame.len(),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn led_count(&self) -> usize {
        self.led_count
    }

    pub fn frame_delay(&self) -> u32 {
        self.frame_delay
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn encoded_len(&self) -> usize {
        self.led_count * BYTES_PER_PIXEL * self.frames.len()
    }

    /// Concatenation of every frame's encoding in append order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        for frame in &self.frames {
            frame.encode_into(&mut buffer);
        }
        buffer
    }

    pub fn config(&self) -> MovieConfig {
        MovieConfig {
            leds_number: self.led_count,
            frames_number: self.frames.len(),
            frame_delay: self.frame_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_black() {
        for n in [0, 1, 7, 600] {
            let frame = Frame::new(n);
            assert_eq!(frame.len(), n);
            assert!(frame.pixels().iter().all(|p| *p == Pixel::BLACK));
        }
    }

    #[test]
    fn filled_frame_encodes_repeated_triples() {
        let mut frame = Frame::new(4);
        frame.fill(Pixel::new(10, 20, 30));
        let encoded = frame.encode();
        assert_eq!(encoded.len(), 12);
        assert_eq!(encoded, [10u8, 20, 30].repeat(4));
    }

    #[test]
    fn encode_keeps_rgb_order_per_index() {
        let mut frame = Frame::new(3);
        frame[0] = Pixel::new(255, 0, 0);
        frame[1].g = 128;
        assert!(frame.set(2, Pixel::new(0, 0, 1)));
        assert_eq!(frame.encode(), vec![255, 0, 0, 0, 128, 0, 0, 0, 1]);
    }

    #[test]
    fn set_past_the_end_is_rejected() {
        let mut frame = Frame::new(2);
        assert!(!frame.set(2, Pixel::new(1, 1, 1)));
        assert_eq!(frame.get(2), None);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn fill_overwrites_customized_pixels() {
        let mut frame = Frame::new(3);
        frame[1] = Pixel::new(9, 9, 9);
        frame.fill(Pixel::new(0, 255, 0));
        assert!(frame.pixels().iter().all(|p| *p == Pixel::new(0, 255, 0)));
    }

    #[test]
    fn movie_encoding_concatenates_frames_in_order() {
        let mut red = Frame::new(5);
        red.fill(Pixel::new(255, 0, 0));
        red[0] = Pixel::new(0, 0, 255);
        let mut green = Frame::new(5);
        green.fill(Pixel::new(0, 255, 0));

        let movie = Movie::with_frames(5, 500, [red.clone(), green.clone()]).unwrap();
        let encoded = movie.encode();
        assert_eq!(encoded.len(), 3 * 5 * 2);
        assert_eq!(encoded.len(), movie.encoded_len());

        let mut expected = red.encode();
        expected.extend(green.encode());
        assert_eq!(encoded, expected);
    }

    #[test]
    fn empty_movie_encodes_to_nothing() {
        let movie = Movie::new(10, 100);
        assert!(movie.encode().is_empty());
        assert_eq!(movie.config().frames_number, 0);
    }

    #[test]
    fn push_frame_rejects_length_mismatch() {
        let mut movie = Movie::new(4, 50);
        let err = movie.push_frame(Frame::new(3)).unwrap_err();
        assert!(matches!(
            err,
            TwinklyError::FrameLength {
                expected: 4,
                actual: 3
            }
        ));
        assert_eq!(movie.frame_count(), 0);
    }

    #[test]
    fn config_matches_movie_shape() {
        let movie = Movie::with_frames(600, 500, [Frame::new(600), Frame::new(600)]).unwrap();
        let config = movie.config();
        assert_eq!(
            config,
            MovieConfig {
                leds_number: 600,
                frames_number: 2,
                frame_delay: 500,
            }
        );
        assert_eq!(
            serde_json::to_value(config).unwrap(),
            serde_json::json!({ "leds_number": 600, "frames_number": 2, "frame_delay": 500 })
        );
    }

    #[test]
    fn clamped_saturates_channels() {
        assert_eq!(Pixel::clamped(-5, 128, 300), Pixel::new(0, 128, 255));
    }

    #[test]
    fn parses_pixel_triples() {
        assert_eq!("255, 0,16".parse::<Pixel>().unwrap(), Pixel::new(255, 0, 16));
        for bad in ["256,0,0", "1,2", "1,2,3,4", "red"] {
            let err = bad.parse::<Pixel>().unwrap_err();
            assert!(
                matches!(err, TwinklyError::InvalidPixel(ref input) if input == bad),
                "{bad} gave {err:?}"
            );
        }
    }
}

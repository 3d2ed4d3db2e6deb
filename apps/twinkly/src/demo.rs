use twinkly_client::{Frame, Movie, Pixel, Result};

const RED: Pixel = Pixel::new(255, 0, 0);
const GREEN: Pixel = Pixel::new(0, 255, 0);
const BLUE: Pixel = Pixel::new(0, 0, 255);

/// Two-frame sample: red with a blue marker at the start of each half of the
/// strand, then solid green.
pub fn demo_movie(led_count: usize, frame_delay: u32) -> Result<Movie> {
    let mut red = Frame::new(led_count);
    red.fill(RED);
    red.set(0, BLUE);
    red.set(led_count / 2, BLUE);

    let mut green = Frame::new(led_count);
    green.fill(GREEN);

    Movie::with_frames(led_count, frame_delay, [red, green])
}

//! Dashboard rendering onto an abstract draw target.
//!
//! The control loop never talks to display hardware directly; it hands a
//! [`DashboardFrame`] to whatever implements [`RenderSurface`]. The
//! concrete [`Dashboard`] draws onto any `embedded-graphics` target, which
//! is the mipidsi panel on the device.

use core::fmt::Write as _;

use embedded_graphics::Drawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_8X13, FONT_8X13_BOLD};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use heapless::String;

use crate::decision::VentilationStatus;
use crate::sensors::Climate;

/// Panel geometry (portrait).
pub const DISPLAY_WIDTH: u16 = 172;
pub const DISPLAY_HEIGHT: u16 = 320;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const TEXT: Rgb565 = Rgb565::WHITE;
const HEADING: Rgb565 = Rgb565::CYAN;
const PRESSURE: Rgb565 = Rgb565::new(31, 40, 0);
const FAULT_BACKGROUND: Rgb565 = Rgb565::new(17, 0, 0);

const MARGIN_X: i32 = 15;
const LINE_HEIGHT: i32 = 15;
const STATUS_BAR_Y: i32 = 260;
const FONT_WIDTH: i32 = 8;

/// Everything one cycle hands to the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardFrame {
    pub indoor: Climate,
    pub outdoor: Climate,
    pub pressure_hpa: f32,
    pub dewpoint_indoor_c: f32,
    pub dewpoint_outdoor_c: f32,
    pub status: VentilationStatus,
    /// Seconds since boot, shown so a frozen display is recognizable.
    pub uptime_s: u64,
}

/// Output surface for readings and error states.
///
/// Implementations absorb their own failures as far as they can; the
/// control loop treats any error that still escapes as "reinit, then show
/// the error state" and never lets rendering take a cycle down.
pub trait RenderSurface {
    type Error: core::fmt::Debug;

    fn show_readings(&mut self, frame: &DashboardFrame) -> Result<(), Self::Error>;

    fn show_error(&mut self, message: &str) -> Result<(), Self::Error>;

    /// Best-effort reinitialization after a failed draw.
    fn reinit(&mut self) -> Result<(), Self::Error>;
}

/// Fixed-layout dashboard: indoor block, outdoor block, pressure line and
/// a colored status bar across the bottom of the portrait panel.
pub struct Dashboard<D> {
    target: D,
}

impl<D> Dashboard<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    /// Give the draw target back, e.g. to re-run panel initialization.
    pub fn release(self) -> D {
        self.target
    }

    fn line(&mut self, text: &str, x: i32, y: i32, color: Rgb565) -> Result<(), D::Error> {
        Text::new(text, Point::new(x, y), MonoTextStyle::new(&FONT_8X13, color))
            .draw(&mut self.target)?;
        Ok(())
    }

    fn climate_block(
        &mut self,
        heading: &str,
        climate: &Climate,
        dewpoint_c: f32,
        y: i32,
    ) -> Result<(), D::Error> {
        self.line(heading, MARGIN_X, y, HEADING)?;

        let mut text: String<24> = String::new();
        let _ = write!(text, "Temp: {:.1} C", climate.temperature_c);
        self.line(&text, MARGIN_X, y + 20, TEXT)?;

        text.clear();
        let _ = write!(text, "Humidity: {:.1} %", climate.humidity_pct);
        self.line(&text, MARGIN_X, y + 20 + LINE_HEIGHT, TEXT)?;

        text.clear();
        let _ = write!(text, "Dew point: {:.1} C", dewpoint_c);
        self.line(&text, MARGIN_X, y + 20 + 2 * LINE_HEIGHT, TEXT)
    }

    fn status_bar(&mut self, status: VentilationStatus) -> Result<(), D::Error> {
        Rectangle::new(
            Point::new(0, STATUS_BAR_Y),
            Size::new(
                DISPLAY_WIDTH as u32,
                (DISPLAY_HEIGHT as i32 - STATUS_BAR_Y) as u32,
            ),
        )
        .into_styled(PrimitiveStyle::with_fill(status.color()))
        .draw(&mut self.target)?;

        let label = status.label();
        let x = (DISPLAY_WIDTH as i32 - label.len() as i32 * FONT_WIDTH).max(0) / 2;
        Text::new(
            label,
            Point::new(x, STATUS_BAR_Y + 25),
            MonoTextStyle::new(&FONT_8X13_BOLD, TEXT),
        )
        .draw(&mut self.target)?;
        Ok(())
    }
}

impl<D> RenderSurface for Dashboard<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Error = D::Error;

    fn show_readings(&mut self, frame: &DashboardFrame) -> Result<(), Self::Error> {
        self.target.clear(BACKGROUND)?;

        self.climate_block("INDOOR", &frame.indoor, frame.dewpoint_indoor_c, 15)?;
        self.climate_block("OUTDOOR", &frame.outdoor, frame.dewpoint_outdoor_c, 110)?;

        let mut text: String<24> = String::new();
        let _ = write!(text, "Pressure: {:.0} hPa", frame.pressure_hpa);
        self.line(&text, MARGIN_X, 205, PRESSURE)?;

        text.clear();
        let _ = write!(text, "Up: {} min", frame.uptime_s / 60);
        self.line(&text, MARGIN_X, 205 + LINE_HEIGHT, TEXT)?;

        self.status_bar(frame.status)
    }

    fn show_error(&mut self, message: &str) -> Result<(), Self::Error> {
        self.target.clear(FAULT_BACKGROUND)?;
        self.line("FAULT", MARGIN_X, 30, TEXT)?;
        self.line(message, MARGIN_X, 60, TEXT)
    }

    fn reinit(&mut self) -> Result<(), Self::Error> {
        self.target.clear(BACKGROUND)
    }
}

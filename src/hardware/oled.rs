use defmt::{Debug2Format, warn};
use embedded_graphics::{
    mono_font::{MonoTextStyle, MonoTextStyleBuilder, ascii::FONT_8X13, ascii::FONT_10X20},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_hal::i2c::I2c;
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

use super::traits::Renderer;
use crate::machine::Mode;
use crate::view::View;

const WIDTH: i32 = 128;

/// Rows (top baseline) of the title and the three body lines
const ROWS: [i32; 4] = [0, 16, 38, 51];

type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// SSD1306 128x64 OLED showing the composed screen for each view.
pub struct OledRenderer<I2C> {
    display: Display<I2C>,
    small: MonoTextStyle<'static, BinaryColor>,
    large: MonoTextStyle<'static, BinaryColor>,
}

impl<I2C> OledRenderer<I2C>
where
    I2C: I2c,
{
    /// Bring the panel up. A panel that fails to initialise is logged and
    /// left dark; the rest of the firmware keeps running.
    pub fn new(i2c: I2C) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        if let Err(e) = display.init() {
            warn!("OLED init failed: {}", Debug2Format(&e));
        }

        let small = MonoTextStyleBuilder::new()
            .font(&FONT_8X13)
            .text_color(BinaryColor::On)
            .build();
        let large = MonoTextStyleBuilder::new()
            .font(&FONT_10X20)
            .text_color(BinaryColor::On)
            .build();

        Self {
            display,
            small,
            large,
        }
    }

    /// Draw `text` horizontally centred with its top at `y`.
    fn centered(&mut self, text: &str, y: i32, style: MonoTextStyle<'static, BinaryColor>) {
        let char_width = style.font.character_size.width as i32;
        let x = ((WIDTH - text.len() as i32 * char_width) / 2).max(0);
        // drawing into the frame buffer cannot fail
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.display);
    }
}

impl<I2C> Renderer for OledRenderer<I2C>
where
    I2C: I2c,
{
    fn render(&mut self, mode: Mode, view: &View) {
        let screen = view.screen();
        self.display.clear_buffer();

        self.centered(screen.title, ROWS[0], self.small);
        // the time itself is drawn large, history lines small
        let first = if mode == Mode::History { self.small } else { self.large };
        self.centered(&screen.lines[0], ROWS[1], first);
        self.centered(&screen.lines[1], ROWS[2], self.small);
        self.centered(&screen.lines[2], ROWS[3], self.small);

        if let Err(e) = self.display.flush() {
            warn!("OLED flush failed: {}", Debug2Format(&e));
        }
    }
}

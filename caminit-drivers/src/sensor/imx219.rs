//! Sony IMX219 (Raspberry Pi camera v2)
//!
//! The IMX219 is configured entirely through 8-bit registers at 16-bit
//! addresses. Multi-byte fields are big-endian: the high byte lives at the
//! field address, the low byte at the next one.
//!
//! # Bring-up
//!
//! The preview mode is 640×480, x4 binned from the full 2560×1920 window,
//! RAW8 data over two CSI lanes from a 24 MHz external clock:
//!
//! ```text
//! standby ─► mfg access unlock ─► lanes/clock ─► frame/line length
//!   ─► crop window ─► output size ─► binning ─► PLL ─► vendor tuning
//!   ─► [analog gain] ─► [test pattern] ─► [extra writes] ─► stream on
//! ```

use caminit_core::RegisterWrite;
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// IMX219 register addresses
pub mod reg {
    /// Standby (0) or streaming (1)
    pub const MODE_SELECT: u16 = 0x0100;
    /// Data lane count (1 = two lanes)
    pub const CSI_LANE_MODE: u16 = 0x0114;
    /// D-PHY timing control
    pub const DPHY_CTRL: u16 = 0x0128;
    /// External clock in MHz, 8.8 fixed point
    pub const EXCK_FREQ: u16 = 0x012A;
    /// Analog gain, context A
    pub const ANA_GAIN_GLOBAL_A: u16 = 0x0157;
    /// Frame length in lines, context A
    pub const FRAME_LENGTH_A: u16 = 0x0160;
    /// Line length in pixel clocks, context A
    pub const LINE_LENGTH_A: u16 = 0x0162;
    /// Crop window, context A
    pub const X_ADD_STA_A: u16 = 0x0164;
    pub const X_ADD_END_A: u16 = 0x0166;
    pub const Y_ADD_STA_A: u16 = 0x0168;
    pub const Y_ADD_END_A: u16 = 0x016A;
    /// Output size after binning
    pub const X_OUTPUT_SIZE: u16 = 0x016C;
    pub const Y_OUTPUT_SIZE: u16 = 0x016E;
    /// Readout increments for odd pixels
    pub const X_ODD_INC_A: u16 = 0x0170;
    pub const Y_ODD_INC_A: u16 = 0x0171;
    /// Binning mode (0 = none, 1 = x2, 2 = x4)
    pub const BINNING_MODE_H_A: u16 = 0x0174;
    pub const BINNING_MODE_V_A: u16 = 0x0175;
    /// Data format, context A (0x0808 = RAW8, 0x0A0A = RAW10)
    pub const CSI_DATA_FORMAT_A: u16 = 0x018C;
    /// Analog gain, context B
    pub const ANA_GAIN_GLOBAL_B: u16 = 0x0257;
    /// Video timing pixel clock divider
    pub const VTPXCK_DIV: u16 = 0x0301;
    /// Video timing system clock divider
    pub const VTSYCK_DIV: u16 = 0x0303;
    /// Pre-PLL dividers
    pub const PREPLLCK_VT_DIV: u16 = 0x0304;
    pub const PREPLLCK_OP_DIV: u16 = 0x0305;
    /// Video timing PLL multiplier (11 bits)
    pub const PLL_VT_MPY: u16 = 0x0306;
    /// Output pixel clock divider
    pub const OPPXCK_DIV: u16 = 0x0309;
    /// Output system clock divider
    pub const OPSYCK_DIV: u16 = 0x030B;
    /// Output PLL multiplier (11 bits)
    pub const PLL_OP_MPY: u16 = 0x030C;
    /// Test pattern selector
    pub const TEST_PATTERN_MODE: u16 = 0x0600;
    /// Solid colour test pattern values (10 bits each)
    pub const TD_R: u16 = 0x0602;
    pub const TD_GR: u16 = 0x0604;
    pub const TD_B: u16 = 0x0606;
    pub const TD_GB: u16 = 0x0608;
    /// Test pattern window
    pub const TP_WINDOW_WIDTH: u16 = 0x0624;
    pub const TP_WINDOW_HEIGHT: u16 = 0x0626;
    /// Manufacturer register access key
    pub const MFG_ACCESS: u16 = 0x30EB;
    pub const MFG_UNLOCK_A: u16 = 0x300A;
    pub const MFG_UNLOCK_B: u16 = 0x300B;
}

/// Frame length of the preview mode, in lines
pub const FRAME_LENGTH_LINES: u16 = 666;

/// Line length of the preview mode, in pixel clocks
pub const LINE_LENGTH_PCK: u16 = 3448;

const MODE_STANDBY: u8 = 0x00;
const MODE_STREAMING: u8 = 0x01;

/// Highest 10-bit test pattern value
const MAX_PATTERN_VALUE: u16 = 0x03FF;

/// Writes produced by [`TestPatternConfig::writes`]
pub const TEST_PATTERN_WRITES: usize = 14;

/// Writes produced by an analog gain setting
pub const ANALOG_GAIN_WRITES: usize = 2;

const MAX_OPTION_WRITES: usize = TEST_PATTERN_WRITES + ANALOG_GAIN_WRITES;

/// Enter standby; always the first write
pub const STANDBY: RegisterWrite = RegisterWrite::new(reg::MODE_SELECT, MODE_STANDBY);

/// Start streaming; always the last write
pub const STREAM_ON: RegisterWrite = RegisterWrite::new(reg::MODE_SELECT, MODE_STREAMING);

const fn high(field: u16, value: u16) -> RegisterWrite {
    RegisterWrite::new(field, (value >> 8) as u8)
}

const fn low(field: u16, value: u16) -> RegisterWrite {
    RegisterWrite::new(field + 1, (value & 0xFF) as u8)
}

/// 640×480 x4-binned preview mode, without the final stream-on
pub static PREVIEW_640X480: &[RegisterWrite] = &[
    STANDBY,
    // Manufacturer-specific access sequence
    RegisterWrite::new(reg::MFG_ACCESS, 0x05),
    RegisterWrite::new(reg::MFG_ACCESS, 0x0C),
    RegisterWrite::new(reg::MFG_UNLOCK_A, 0xFF),
    RegisterWrite::new(reg::MFG_UNLOCK_B, 0xFF),
    RegisterWrite::new(reg::MFG_ACCESS, 0x05),
    RegisterWrite::new(reg::MFG_ACCESS, 0x09),
    // Two lanes, auto D-PHY timing, 24 MHz EXCK
    RegisterWrite::new(reg::CSI_LANE_MODE, 0x01),
    RegisterWrite::new(reg::DPHY_CTRL, 0x00),
    high(reg::EXCK_FREQ, 0x1800),
    low(reg::EXCK_FREQ, 0x1800),
    high(reg::FRAME_LENGTH_A, FRAME_LENGTH_LINES),
    low(reg::FRAME_LENGTH_A, FRAME_LENGTH_LINES),
    high(reg::LINE_LENGTH_A, LINE_LENGTH_PCK),
    low(reg::LINE_LENGTH_A, LINE_LENGTH_PCK),
    // Crop 0..2560 × 0..1920
    high(reg::X_ADD_STA_A, 0),
    low(reg::X_ADD_STA_A, 0),
    high(reg::X_ADD_END_A, 0x0A00),
    low(reg::X_ADD_END_A, 0x0A00),
    high(reg::Y_ADD_STA_A, 0),
    low(reg::Y_ADD_STA_A, 0),
    high(reg::Y_ADD_END_A, 0x0780),
    low(reg::Y_ADD_END_A, 0x0780),
    high(reg::X_OUTPUT_SIZE, 640),
    low(reg::X_OUTPUT_SIZE, 640),
    high(reg::Y_OUTPUT_SIZE, 480),
    low(reg::Y_OUTPUT_SIZE, 480),
    RegisterWrite::new(reg::X_ODD_INC_A, 0x01),
    RegisterWrite::new(reg::Y_ODD_INC_A, 0x01),
    RegisterWrite::new(reg::BINNING_MODE_H_A, 0x02),
    RegisterWrite::new(reg::BINNING_MODE_V_A, 0x02),
    high(reg::CSI_DATA_FORMAT_A, 0x0808),
    low(reg::CSI_DATA_FORMAT_A, 0x0808),
    // PLL
    RegisterWrite::new(reg::VTPXCK_DIV, 0x08),
    RegisterWrite::new(reg::VTSYCK_DIV, 0x01),
    RegisterWrite::new(reg::PREPLLCK_VT_DIV, 0x03),
    RegisterWrite::new(reg::PREPLLCK_OP_DIV, 0x03),
    high(reg::PLL_VT_MPY, 0x0014),
    low(reg::PLL_VT_MPY, 0x0014),
    RegisterWrite::new(reg::OPPXCK_DIV, 0x08),
    RegisterWrite::new(reg::OPSYCK_DIV, 0x02),
    high(reg::PLL_OP_MPY, 0x000A),
    low(reg::PLL_OP_MPY, 0x000A),
    // Undocumented vendor tuning
    RegisterWrite::new(0x455E, 0x00),
    RegisterWrite::new(0x471E, 0x4B),
    RegisterWrite::new(0x4767, 0x0F),
    RegisterWrite::new(0x4750, 0x14),
    RegisterWrite::new(0x4540, 0x00),
    RegisterWrite::new(0x47B4, 0x14),
    RegisterWrite::new(0x4713, 0x30),
    RegisterWrite::new(0x478B, 0x10),
    RegisterWrite::new(0x478F, 0x10),
    RegisterWrite::new(0x4793, 0x10),
    RegisterWrite::new(0x4797, 0x0E),
    RegisterWrite::new(0x479B, 0x0E),
];

/// Test pattern generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TestPattern {
    /// Single colour from the TD_* registers
    #[default]
    SolidColour,
    /// 100% colour bars
    ColourBars,
    /// Fade to grey colour bars
    FadeToGrey,
    /// PN9 pseudo-random data
    Pn9,
}

impl TestPattern {
    /// TEST_PATTERN_MODE register value
    pub fn mode(self) -> u16 {
        match self {
            TestPattern::SolidColour => 1,
            TestPattern::ColourBars => 2,
            TestPattern::FadeToGrey => 3,
            TestPattern::Pn9 => 4,
        }
    }
}

/// Test pattern setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct TestPatternConfig {
    pub pattern: TestPattern,
    /// Solid colour channel values, masked to 10 bits
    pub red: u16,
    pub green_r: u16,
    pub blue: u16,
    pub green_b: u16,
    /// Pattern window size
    pub width: u16,
    pub height: u16,
}

impl Default for TestPatternConfig {
    fn default() -> Self {
        Self {
            pattern: TestPattern::SolidColour,
            red: 0x2AA,
            green_r: 0x2AA,
            blue: 0x2AA,
            green_b: 0x2AA,
            width: 0x0A00,
            height: 0x0780,
        }
    }
}

impl TestPatternConfig {
    /// Register writes enabling this pattern
    pub fn writes(&self) -> [RegisterWrite; TEST_PATTERN_WRITES] {
        let mode = self.pattern.mode();
        let red = self.red & MAX_PATTERN_VALUE;
        let green_r = self.green_r & MAX_PATTERN_VALUE;
        let blue = self.blue & MAX_PATTERN_VALUE;
        let green_b = self.green_b & MAX_PATTERN_VALUE;
        [
            high(reg::TEST_PATTERN_MODE, mode),
            low(reg::TEST_PATTERN_MODE, mode),
            high(reg::TD_R, red),
            low(reg::TD_R, red),
            high(reg::TD_GR, green_r),
            low(reg::TD_GR, green_r),
            high(reg::TD_B, blue),
            low(reg::TD_B, blue),
            high(reg::TD_GB, green_b),
            low(reg::TD_GB, green_b),
            high(reg::TP_WINDOW_WIDTH, self.width),
            low(reg::TP_WINDOW_WIDTH, self.width),
            high(reg::TP_WINDOW_HEIGHT, self.height),
            low(reg::TP_WINDOW_HEIGHT, self.height),
        ]
    }
}

/// Optional additions to the preview mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Imx219Config {
    /// Analog gain code for both contexts
    pub analog_gain: Option<u8>,
    /// Replace the image with a test pattern
    pub test_pattern: Option<TestPatternConfig>,
}

impl Imx219Config {
    /// Full bring-up sequence, with `extra` writes just before stream-on
    pub fn init_sequence<'a>(&self, extra: &'a [RegisterWrite]) -> InitSequence<'a> {
        let mut options: Vec<RegisterWrite, MAX_OPTION_WRITES> = Vec::new();
        if let Some(gain) = self.analog_gain {
            let _ = options.push(RegisterWrite::new(reg::ANA_GAIN_GLOBAL_A, gain));
            let _ = options.push(RegisterWrite::new(reg::ANA_GAIN_GLOBAL_B, gain));
        }
        if let Some(pattern) = &self.test_pattern {
            // Capacity covers gain and pattern together
            let _ = options.extend_from_slice(&pattern.writes());
        }

        InitSequence {
            table: PREVIEW_640X480.iter(),
            options,
            option_pos: 0,
            extra: extra.iter(),
            stream_on: true,
        }
    }
}

/// Ordered bring-up writes: preview table, options, extras, stream-on
#[derive(Debug, Clone)]
pub struct InitSequence<'a> {
    table: core::slice::Iter<'static, RegisterWrite>,
    options: Vec<RegisterWrite, MAX_OPTION_WRITES>,
    option_pos: usize,
    extra: core::slice::Iter<'a, RegisterWrite>,
    stream_on: bool,
}

impl Iterator for InitSequence<'_> {
    type Item = RegisterWrite;

    fn next(&mut self) -> Option<RegisterWrite> {
        if let Some(write) = self.table.next() {
            return Some(*write);
        }
        if let Some(write) = self.options.get(self.option_pos) {
            self.option_pos += 1;
            return Some(*write);
        }
        if let Some(write) = self.extra.next() {
            return Some(*write);
        }
        if self.stream_on {
            self.stream_on = false;
            return Some(STREAM_ON);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.len()
            + (self.options.len() - self.option_pos)
            + self.extra.len()
            + usize::from(self.stream_on);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for InitSequence<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn collect(seq: InitSequence<'_>) -> Vec<RegisterWrite> {
        seq.collect()
    }

    #[test]
    fn test_preview_table_size() {
        assert_eq!(PREVIEW_640X480.len(), 55);
        let seq = Imx219Config::default().init_sequence(&[]);
        assert_eq!(seq.len(), 56);
    }

    #[test]
    fn test_standby_first_stream_on_last() {
        let writes = collect(Imx219Config::default().init_sequence(&[]));
        assert_eq!(writes.first(), Some(&RegisterWrite::new(0x0100, 0x00)));
        assert_eq!(writes.last(), Some(&RegisterWrite::new(0x0100, 0x01)));
        // Mode select appears only at the ends
        let mode_writes = writes
            .iter()
            .filter(|w| w.address == reg::MODE_SELECT)
            .count();
        assert_eq!(mode_writes, 2);
    }

    #[test]
    fn test_timing_fields() {
        let expect = [
            RegisterWrite::new(0x0160, 0x02),
            RegisterWrite::new(0x0161, 0x9A),
            RegisterWrite::new(0x0162, 0x0D),
            RegisterWrite::new(0x0163, 0x78),
        ];
        assert_eq!(&PREVIEW_640X480[11..15], &expect[..]);
    }

    #[test]
    fn test_output_size_fields() {
        let writes = collect(Imx219Config::default().init_sequence(&[]));
        let find = |addr: u16| writes.iter().find(|w| w.address == addr).map(|w| w.value);
        assert_eq!(find(0x016C), Some(0x02));
        assert_eq!(find(0x016D), Some(0x80));
        assert_eq!(find(0x016E), Some(0x01));
        assert_eq!(find(0x016F), Some(0xE0));
        assert_eq!(find(0x012A), Some(0x18));
        assert_eq!(find(0x030D), Some(0x0A));
    }

    #[test]
    fn test_unlock_sequence_order() {
        let unlock: Vec<(u16, u8)> = PREVIEW_640X480[1..7]
            .iter()
            .map(|w| (w.address, w.value))
            .collect();
        assert_eq!(
            unlock,
            vec![
                (0x30EB, 0x05),
                (0x30EB, 0x0C),
                (0x300A, 0xFF),
                (0x300B, 0xFF),
                (0x30EB, 0x05),
                (0x30EB, 0x09),
            ]
        );
    }

    #[test]
    fn test_default_solid_colour_pattern() {
        let writes = TestPatternConfig::default().writes();
        assert_eq!(writes[0], RegisterWrite::new(0x0600, 0x00));
        assert_eq!(writes[1], RegisterWrite::new(0x0601, 0x01));
        for pair in writes[2..10].chunks(2) {
            assert_eq!(pair[0].value, 0x02);
            assert_eq!(pair[1].value, 0xAA);
        }
        assert_eq!(writes[10], RegisterWrite::new(0x0624, 0x0A));
        assert_eq!(writes[11], RegisterWrite::new(0x0625, 0x00));
        assert_eq!(writes[12], RegisterWrite::new(0x0626, 0x07));
        assert_eq!(writes[13], RegisterWrite::new(0x0627, 0x80));
    }

    #[test]
    fn test_pattern_values_masked() {
        let config = TestPatternConfig {
            pattern: TestPattern::ColourBars,
            red: 0xFFFF,
            ..TestPatternConfig::default()
        };
        let writes = config.writes();
        assert_eq!(writes[1].value, 0x02);
        assert_eq!(writes[2], RegisterWrite::new(0x0602, 0x03));
        assert_eq!(writes[3], RegisterWrite::new(0x0603, 0xFF));
    }

    #[test]
    fn test_options_before_stream_on() {
        let extra = [RegisterWrite::new(0x0172, 0x03)];
        let config = Imx219Config {
            analog_gain: Some(232),
            test_pattern: Some(TestPatternConfig::default()),
        };
        let seq = config.init_sequence(&extra);
        assert_eq!(seq.len(), 55 + 2 + 14 + 1 + 1);

        let writes = collect(seq);
        assert_eq!(writes[55], RegisterWrite::new(0x0157, 232));
        assert_eq!(writes[56], RegisterWrite::new(0x0257, 232));
        assert_eq!(writes[57].address, reg::TEST_PATTERN_MODE);
        assert_eq!(writes[71], extra[0]);
        assert_eq!(writes[72], STREAM_ON);
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let mut seq = Imx219Config::default().init_sequence(&[]);
        for _ in 0..10 {
            seq.next();
        }
        assert_eq!(seq.len(), 46);
        assert_eq!(seq.by_ref().count(), 46);
        assert_eq!(seq.next(), None);
    }
}

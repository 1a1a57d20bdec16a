//! LPC residual generation and the history the pitch search looks back into.

use itertools::izip;

use super::{FRAME_SIZE, LPC_ORDER, PITCH_MAX_PERIOD};
use crate::dsp::filters::biquad;
use crate::dsp::xcorr::inner_prod;

/// History plus one frame: enough to look back `PITCH_MAX_PERIOD` samples
/// from any point of the current frame.
pub const PITCH_BUF_SIZE: usize = PITCH_MAX_PERIOD + FRAME_SIZE;

/// Weight of the previous residual sample mixed into the excitation.
const EXC_TILT: f32 = 0.7;

/// Low-pass section applied to the residual before voicing analysis.
static LP_B: [f32; 2] = [-0.84946, 1.0];
static LP_A: [f32; 2] = [-1.54220, 0.70781];

/// Fixed-length sample history whose last `FRAME_SIZE` entries are the
/// current frame.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    buf: [f32; PITCH_BUF_SIZE],
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        HistoryBuffer {
            buf: [0.0; PITCH_BUF_SIZE],
        }
    }
}

impl HistoryBuffer {
    /// Drop the oldest frame to make room for a new one.
    pub fn advance(&mut self) {
        self.buf.copy_within(FRAME_SIZE.., 0);
    }

    pub fn clear(&mut self) {
        self.buf.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buf
    }

    pub fn frame(&self) -> &[f32] {
        &self.buf[PITCH_MAX_PERIOD..]
    }

    pub fn frame_mut(&mut self) -> &mut [f32] {
        &mut self.buf[PITCH_MAX_PERIOD..]
    }

    /// The current frame delayed by `lag` samples.
    pub fn delayed(&self, lag: usize) -> &[f32] {
        let start = PITCH_MAX_PERIOD - lag;
        &self.buf[start..start + FRAME_SIZE]
    }
}

/// Whitens the aligned input with the frame's LPC and keeps the residual
/// (tilted) and its low-passed copy.
#[derive(Clone, Debug, Default)]
pub struct ExcitationGenerator {
    exc: HistoryBuffer,
    lp: HistoryBuffer,
    pitch_mem: [f32; LPC_ORDER],
    pitch_filt: f32,
    lp_mem: [f32; 2],
}

impl ExcitationGenerator {
    pub fn reset(&mut self) {
        self.exc.clear();
        self.lp.clear();
        self.pitch_mem.fill(0.0);
        self.pitch_filt = 0.0;
        self.lp_mem = [0.0; 2];
    }

    /// Residual history used for the correlation search.
    pub fn excitation(&self) -> &HistoryBuffer {
        &self.exc
    }

    /// Low-passed residual history used for voicing.
    pub fn lowpass(&self) -> &HistoryBuffer {
        &self.lp
    }

    /// Append one frame of residual computed from `aligned` and `lpc`.
    pub fn process(&mut self, aligned: &[f32; FRAME_SIZE], lpc: &[f32; LPC_ORDER]) {
        self.exc.advance();
        self.lp.advance();
        let exc = self.exc.frame_mut();
        let lp = self.lp.frame_mut();
        for (i, &x) in aligned.iter().enumerate() {
            let sum = izip!(lpc, &self.pitch_mem).fold(x, |acc, (a, m)| acc + a * m);
            self.pitch_mem.copy_within(..LPC_ORDER - 1, 1);
            self.pitch_mem[0] = x;
            lp[i] = sum;
            exc[i] = sum + EXC_TILT * self.pitch_filt;
            self.pitch_filt = sum;
        }
        biquad(lp, &mut self.lp_mem, &LP_B, &LP_A);
    }

    /// Normalized correlation between the low-passed frame and itself
    /// `period` samples earlier.
    pub fn frame_correlation(&self, period: usize) -> f32 {
        let x = self.lp.frame();
        let y = self.lp.delayed(period);
        let xx = inner_prod(x, x, FRAME_SIZE);
        let yy = inner_prod(y, y, FRAME_SIZE);
        let xy = inner_prod(x, y, FRAME_SIZE);
        xy / (1.0 + xx * yy).sqrt()
    }
}

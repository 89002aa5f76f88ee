//! Pointer-driven fan layout for the project drawer.
//!
//! Every pointer sample is projected into one [`LayoutFrame`] per card: a
//! continuous focus point is derived from the pointer's horizontal fraction,
//! and every card's transform is a function of its signed distance from that
//! focus. There is no per-card animation state to drift; identical inputs
//! always produce identical output.

use serde::{Deserialize, Serialize};

/// Resting-stack per-index offsets and rotation (pointer outside container).
const REST_STEP_X: f64 = 6.0;
const REST_STEP_Y: f64 = 4.0;
const REST_STEP_ROT: f64 = 1.5;

/// Active-mode coefficients per unit of distance from the focus point.
const SPREAD_X: f64 = 120.0;
const DROP_Y: f64 = 18.0;
const TILT_Y: f64 = 12.0;
const LEAN_Z: f64 = 3.0;
const DEPTH_STEP: f64 = 40.0;
const HOVER_LIFT: f64 = 60.0;

const SCALE_FALLOFF: f64 = 0.08;
const MIN_SCALE: f64 = 0.6;
const DIMMED_OPACITY: f64 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Pointer outside the container: static near-flat stack.
    Resting,
    /// Pointer inside the container: transforms depend on the pointer
    /// fraction.
    Active,
}

/// Transient pointer sample. Never stored between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Horizontal position normalized across the container; clamped to
    /// [0, 1] on use.
    pub fraction: f64,
    /// Card index directly under the pointer, if any. A stale index at or
    /// past the deck length is treated as no hover.
    pub hovered: Option<usize>,
}

impl PointerState {
    pub fn resting() -> Self {
        Self {
            fraction: 0.0,
            hovered: None,
        }
    }

    fn clamped_fraction(&self) -> f64 {
        self.fraction.clamp(0.0, 1.0)
    }

    fn hovered_in(&self, n: usize) -> Option<usize> {
        self.hovered.filter(|&i| i < n)
    }
}

/// Per-card output of one layout pass. Translations are in layout units,
/// rotations in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutFrame {
    pub index: usize,
    pub translate_x: f64,
    pub translate_y: f64,
    pub translate_z: f64,
    pub rotate_y: f64,
    pub rotate_z: f64,
    pub scale: f64,
    pub z_index: i32,
    pub opacity: f64,
}

impl LayoutFrame {
    fn centered(index: usize, z_index: i32) -> Self {
        Self {
            index,
            translate_x: 0.0,
            translate_y: 0.0,
            translate_z: 0.0,
            rotate_y: 0.0,
            rotate_z: 0.0,
            scale: 1.0,
            z_index,
            opacity: 1.0,
        }
    }
}

/// Computes one frame per card index `0..n`. Safe to call on every pointer
/// sample; the only allocation is the returned vec.
pub fn layout(n: usize, pointer: &PointerState, mode: Mode) -> Vec<LayoutFrame> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        // Single card renders centered and untouched in both modes.
        return vec![LayoutFrame::centered(0, 1)];
    }
    match mode {
        Mode::Resting => resting_frames(n),
        Mode::Active => active_frames(n, pointer),
    }
}

fn resting_frames(n: usize) -> Vec<LayoutFrame> {
    (0..n)
        .map(|i| {
            let step = i as f64;
            LayoutFrame {
                index: i,
                translate_x: step * REST_STEP_X,
                translate_y: step * REST_STEP_Y,
                translate_z: 0.0,
                rotate_y: 0.0,
                rotate_z: step * REST_STEP_ROT,
                scale: 1.0,
                z_index: (n - i) as i32,
                opacity: 1.0,
            }
        })
        .collect()
}

fn active_frames(n: usize, pointer: &PointerState) -> Vec<LayoutFrame> {
    let focus = pointer.clamped_fraction() * (n - 1) as f64;
    let hovered = pointer.hovered_in(n);

    let mut frames: Vec<LayoutFrame> = (0..n)
        .map(|i| {
            let distance = i as f64 - focus;
            let spread = distance.abs();
            let is_hovered = hovered == Some(i);

            let scale = if is_hovered {
                1.0
            } else {
                (1.0 - spread * SCALE_FALLOFF).max(MIN_SCALE)
            };
            let translate_z = if is_hovered {
                HOVER_LIFT
            } else {
                -spread * DEPTH_STEP
            };
            let opacity = match hovered {
                Some(h) if h != i => DIMMED_OPACITY,
                _ => 1.0,
            };

            LayoutFrame {
                index: i,
                translate_x: distance * SPREAD_X,
                translate_y: spread * DROP_Y,
                translate_z,
                rotate_y: spread * TILT_Y,
                rotate_z: distance * LEAN_Z,
                scale,
                z_index: 0,
                opacity,
            }
        })
        .collect();

    assign_paint_order(&mut frames, focus, hovered);
    frames
}

/// Ranks cards front-to-back: hovered card first, then ascending distance
/// from focus, ties broken toward the lower index. The rank determines
/// z-index, so paint order is a strict deterministic function of the input.
fn assign_paint_order(frames: &mut [LayoutFrame], focus: f64, hovered: Option<usize>) {
    let n = frames.len();
    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| {
        let key = |i: usize| {
            if hovered == Some(i) {
                -1.0
            } else {
                (i as f64 - focus).abs()
            }
        };
        key(a)
            .partial_cmp(&key(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    for (rank, &i) in ranked.iter().enumerate() {
        frames[i].z_index = (n - rank) as i32;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

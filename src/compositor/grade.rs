// SPDX-License-Identifier: MPL-2.0

//! Colour grading with CSS filter semantics
//!
//! Applies `contrast() brightness() saturate() hue-rotate()` in that order.
//! The two per-channel steps are folded into a lookup table (clamped after
//! each step, as a browser does); saturation and hue rotation are linear in
//! RGB and fold into a single 3×3 matrix that is clamped once at the end.

use crate::config::ColorGrade;
use image::RgbaImage;

type Matrix3 = [[f32; 3]; 3];

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// `saturate(s)` matrix from the W3C Filter Effects Module
fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

/// `hue-rotate(deg)` matrix from the W3C Filter Effects Module
fn hue_rotate_matrix(degrees: f32) -> Matrix3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn multiply(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Precomputed grade, built once per configuration
#[derive(Debug, Clone)]
pub struct GradeOperator {
    lut: [f32; 256],
    matrix: Matrix3,
    identity: bool,
}

impl GradeOperator {
    pub fn new(grade: &ColorGrade) -> Self {
        let mut lut = [0.0f32; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let v = i as f32 / 255.0;
            let v = ((v - 0.5) * grade.contrast + 0.5).clamp(0.0, 1.0);
            *slot = (v * grade.brightness).clamp(0.0, 1.0) * 255.0;
        }

        // Later filters multiply from the left
        let matrix = multiply(
            &hue_rotate_matrix(grade.hue_rotate_degrees),
            &saturate_matrix(grade.saturation),
        );

        let identity = grade.contrast == 1.0
            && grade.brightness == 1.0
            && grade.saturation == 1.0
            && grade.hue_rotate_degrees.rem_euclid(360.0) == 0.0;

        Self {
            lut,
            matrix: if identity { IDENTITY } else { matrix },
            identity,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Grade one RGB triple
    pub fn apply_rgb(&self, rgb: [u8; 3]) -> [u8; 3] {
        let c = [
            self.lut[rgb[0] as usize],
            self.lut[rgb[1] as usize],
            self.lut[rgb[2] as usize],
        ];
        let m = &self.matrix;
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            let v = m[i][0] * c[0] + m[i][1] * c[1] + m[i][2] * c[2];
            *channel = v.round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Grade an image in place; alpha is untouched
    pub fn apply(&self, image: &mut RgbaImage) {
        if self.identity {
            return;
        }
        for pixel in image.pixels_mut() {
            let [r, g, b] = self.apply_rgb([pixel[0], pixel[1], pixel[2]]);
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        }
    }
}

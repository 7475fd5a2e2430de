//! Hashed lattice value noise used to perturb corridor, hall and room outlines.

use super::seed::mix_seed_stream;

const OCTAVES: u32 = 3;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ValueNoise {
    seed: u64,
}

impl ValueNoise {
    pub(crate) fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Lattice value in `[-1, 1]`.
    fn lattice(&self, x: i32, y: i32) -> f32 {
        let key = (u64::from(x as u32) << 32) | u64::from(y as u32);
        let hashed = mix_seed_stream(self.seed, key);
        (hashed >> 40) as f32 / (1_u64 << 23) as f32 - 1.0
    }

    /// Single-octave noise in `[-1, 1]`.
    pub(crate) fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = smoothstep(x - x0);
        let ty = smoothstep(y - y0);
        let (ix, iy) = (x0 as i32, y0 as i32);

        let top = lerp(self.lattice(ix, iy), self.lattice(ix + 1, iy), tx);
        let bottom = lerp(self.lattice(ix, iy + 1), self.lattice(ix + 1, iy + 1), tx);
        lerp(top, bottom, ty)
    }

    /// Three octaves, normalized back into `[-1, 1]`.
    pub(crate) fn fractal(&self, x: f32, y: f32, frequency: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut norm = 0.0;
        let mut scale = frequency;
        for octave in 0..OCTAVES {
            // Offset each octave so lattice points do not line up.
            let shift = octave as f32 * 17.31;
            total += amplitude * self.sample(x * scale + shift, y * scale - shift);
            norm += amplitude;
            amplitude *= 0.5;
            scale *= 2.0;
        }
        total / norm
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

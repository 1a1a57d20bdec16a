//! Mixed-radix complex FFT.
//!
//! Decimation-in-time transform in the kiss_fft layout: the input is scattered
//! through a digit-reversal table, then radix-2/3/4/5 butterflies run from the
//! innermost stage outwards. The forward transform is scaled by `1/nfft`.

use num_complex::Complex32;
use num_traits::Zero;

/// Precomputed plan for one transform size.
#[derive(Clone, Debug, PartialEq)]
pub struct KissFft {
    nfft: usize,
    scale: f32,
    /// `(radix, m)` per stage, outermost first; `m` is the sub-transform length.
    stages: Vec<(usize, usize)>,
    /// Butterfly groups per stage, i.e. the product of the outer radices.
    groups: Vec<usize>,
    bitrev: Vec<usize>,
    twiddles: Vec<Complex32>,
}

/// Factor `n` into radices 4, 2, 3, 5, then reverse so the radix-4 stages
/// sit innermost.
fn factor(n: usize) -> Option<Vec<(usize, usize)>> {
    if n < 2 {
        return None;
    }
    let mut radices: Vec<usize> = Vec::new();
    let mut left = n;
    let mut p = 4;
    while left > 1 {
        while left % p != 0 {
            p = match p {
                4 => 2,
                2 => 3,
                _ => p + 2,
            };
            if p * p > left {
                p = left;
            }
        }
        if p > 5 {
            return None;
        }
        left /= p;
        let stage = radices.len();
        radices.push(p);
        if p == 2 && stage > 1 {
            radices[stage] = 4;
            radices[1] = 2;
        }
    }
    radices.reverse();

    let mut m = n;
    Some(
        radices
            .into_iter()
            .map(|p| {
                m /= p;
                (p, m)
            })
            .collect(),
    )
}

fn compute_bitrev(
    f: &mut [usize],
    mut fout: usize,
    mut pos: usize,
    fstride: usize,
    stages: &[(usize, usize)],
) {
    let (p, m) = stages[0];
    if m == 1 {
        for j in 0..p {
            f[pos + j * fstride] = fout + j;
        }
    } else {
        for _ in 0..p {
            compute_bitrev(f, fout, pos, fstride * p, &stages[1..]);
            pos += fstride;
            fout += m;
        }
    }
}

impl KissFft {
    /// Build a forward plan for `nfft` points.
    ///
    /// Returns `None` when `nfft` has a prime factor above 5.
    pub fn new(nfft: usize) -> Option<Self> {
        let stages = factor(nfft)?;
        let twiddles = (0..nfft)
            .map(|i| {
                let phase = -2.0 * std::f64::consts::PI * i as f64 / nfft as f64;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        let groups = stages
            .iter()
            .scan(1usize, |stride, &(p, _)| {
                let g = *stride;
                *stride *= p;
                Some(g)
            })
            .collect();
        let mut bitrev = vec![0; nfft];
        compute_bitrev(&mut bitrev, 0, 0, 1, &stages);
        Some(KissFft {
            nfft,
            scale: 1.0 / nfft as f32,
            stages,
            groups,
            bitrev,
            twiddles,
        })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.nfft
    }

    pub fn is_empty(&self) -> bool {
        self.nfft == 0
    }

    /// Radix plan as `(radix, m)` pairs, outermost stage first.
    pub fn stages(&self) -> &[(usize, usize)] {
        &self.stages
    }

    /// Forward transform of `fin` into `fout`, scaled by `1/nfft`.
    pub fn process(&self, fin: &[Complex32], fout: &mut [Complex32]) {
        assert_eq!(fin.len(), self.nfft);
        assert_eq!(fout.len(), self.nfft);
        for (&x, &i) in fin.iter().zip(&self.bitrev) {
            fout[i] = x * self.scale;
        }
        self.butterflies(fout);
    }

    fn butterflies(&self, fout: &mut [Complex32]) {
        for (&(p, m), &groups) in self.stages.iter().zip(&self.groups).rev() {
            match p {
                2 => self.bfly2(fout, groups, m),
                3 => self.bfly3(fout, groups, m),
                4 => self.bfly4(fout, groups, m),
                5 => self.bfly5(fout, groups, m),
                _ => unreachable!("radix {p} is rejected by factor()"),
            }
        }
    }

    // In every butterfly the twiddle stride equals the group count, since
    // groups * radix * m == nfft.

    fn bfly2(&self, fout: &mut [Complex32], groups: usize, m: usize) {
        let tw = &self.twiddles;
        for g in 0..groups {
            let base = g * 2 * m;
            for j in 0..m {
                let t = fout[base + j + m] * tw[j * groups];
                fout[base + j + m] = fout[base + j] - t;
                fout[base + j] += t;
            }
        }
    }

    fn bfly3(&self, fout: &mut [Complex32], groups: usize, m: usize) {
        let tw = &self.twiddles;
        let epi3 = tw[groups * m];
        let mut scratch = [Complex32::zero(); 4];
        for g in 0..groups {
            let base = g * 3 * m;
            for j in 0..m {
                let (f0, f1, f2) = (base + j, base + j + m, base + j + 2 * m);
                scratch[1] = fout[f1] * tw[j * groups];
                scratch[2] = fout[f2] * tw[2 * j * groups];

                scratch[3] = scratch[1] + scratch[2];
                scratch[0] = scratch[1] - scratch[2];

                fout[f1] = fout[f0] - scratch[3] * 0.5;
                scratch[0] *= epi3.im;
                fout[f0] += scratch[3];

                fout[f2] = Complex32::new(fout[f1].re + scratch[0].im, fout[f1].im - scratch[0].re);
                fout[f1].re -= scratch[0].im;
                fout[f1].im += scratch[0].re;
            }
        }
    }

    fn bfly4(&self, fout: &mut [Complex32], groups: usize, m: usize) {
        let tw = &self.twiddles;
        let mut scratch = [Complex32::zero(); 6];
        for g in 0..groups {
            let base = g * 4 * m;
            for j in 0..m {
                let (f0, f1, f2, f3) = (base + j, base + j + m, base + j + 2 * m, base + j + 3 * m);
                scratch[0] = fout[f1] * tw[j * groups];
                scratch[1] = fout[f2] * tw[2 * j * groups];
                scratch[2] = fout[f3] * tw[3 * j * groups];

                scratch[5] = fout[f0] - scratch[1];
                fout[f0] += scratch[1];
                scratch[3] = scratch[0] + scratch[2];
                scratch[4] = scratch[0] - scratch[2];
                fout[f2] = fout[f0] - scratch[3];
                fout[f0] += scratch[3];

                fout[f1] = Complex32::new(scratch[5].re + scratch[4].im, scratch[5].im - scratch[4].re);
                fout[f3] = Complex32::new(scratch[5].re - scratch[4].im, scratch[5].im + scratch[4].re);
            }
        }
    }

    fn bfly5(&self, fout: &mut [Complex32], groups: usize, m: usize) {
        let tw = &self.twiddles;
        let ya = tw[groups * m];
        let yb = tw[2 * groups * m];
        let mut s = [Complex32::zero(); 13];
        for g in 0..groups {
            let base = g * 5 * m;
            for u in 0..m {
                let idx = [
                    base + u,
                    base + u + m,
                    base + u + 2 * m,
                    base + u + 3 * m,
                    base + u + 4 * m,
                ];
                s[0] = fout[idx[0]];
                s[1] = fout[idx[1]] * tw[u * groups];
                s[2] = fout[idx[2]] * tw[2 * u * groups];
                s[3] = fout[idx[3]] * tw[3 * u * groups];
                s[4] = fout[idx[4]] * tw[4 * u * groups];

                s[7] = s[1] + s[4];
                s[10] = s[1] - s[4];
                s[8] = s[2] + s[3];
                s[9] = s[2] - s[3];

                fout[idx[0]] += s[7] + s[8];

                s[5] = Complex32::new(
                    s[0].re + (s[7].re * ya.re + s[8].re * yb.re),
                    s[0].im + (s[7].im * ya.re + s[8].im * yb.re),
                );
                s[6] = Complex32::new(
                    s[10].im * ya.im + s[9].im * yb.im,
                    -(s[10].re * ya.im + s[9].re * yb.im),
                );
                fout[idx[1]] = s[5] - s[6];
                fout[idx[4]] = s[5] + s[6];

                s[11] = Complex32::new(
                    s[0].re + (s[7].re * yb.re + s[8].re * ya.re),
                    s[0].im + (s[7].im * yb.re + s[8].im * ya.re),
                );
                s[12] = Complex32::new(
                    s[9].im * ya.im - s[10].im * yb.im,
                    s[10].re * yb.im - s[9].re * ya.im,
                );
                fout[idx[2]] = s[11] + s[12];
                fout[idx[3]] = s[11] - s[12];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_window_size_factors_with_radix4_innermost() {
        let plan = KissFft::new(320).unwrap();
        assert_eq!(plan.stages(), &[(5, 64), (4, 16), (4, 4), (4, 1)]);
    }

    #[test]
    fn group_counts_are_planned_once() {
        let plan = KissFft::new(320).unwrap();
        assert_eq!(plan.groups, vec![1, 5, 20, 80]);
        for (&(p, m), &g) in plan.stages().iter().zip(&plan.groups) {
            assert_eq!(g * p * m, 320);
        }
        let plan = KissFft::new(32).unwrap();
        assert_eq!(plan.groups, vec![1, 4, 8]);
    }

    #[test]
    fn radix2_is_moved_next_to_the_front() {
        // 32 = 4 * 4 * 2 -> stored as 4, 2, 4 before the reversal
        let plan = KissFft::new(32).unwrap();
        assert_eq!(plan.stages(), &[(4, 8), (2, 4), (4, 1)]);
    }

    #[test]
    fn rejects_large_prime_factors() {
        assert!(KissFft::new(49).is_none());
        assert!(KissFft::new(1).is_none());
    }

    #[test]
    fn bitrev_is_a_permutation() {
        let plan = KissFft::new(320).unwrap();
        let mut seen = vec![false; 320];
        for &i in &plan.bitrev {
            assert!(!seen[i]);
            seen[i] = true;
        }
    }

    #[test]
    fn impulse_transforms_to_flat_spectrum() {
        let plan = KissFft::new(60).unwrap();
        let mut x = vec![Complex32::zero(); 60];
        x[0] = Complex32::new(60.0, 0.0);
        let mut y = vec![Complex32::zero(); 60];
        plan.process(&x, &mut y);
        for bin in y {
            assert!((bin.re - 1.0).abs() < 1e-5);
            assert!(bin.im.abs() < 1e-5);
        }
    }
}

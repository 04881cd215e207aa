//! Length normalization of time series by linear interpolation

/// Resample `source` to exactly `target_len` points
///
/// Query positions are spread evenly over the source index range
/// `[0, len - 1]`, both ends included, and each is linearly interpolated
/// between its two neighbouring samples. A source that already has the
/// target length is returned unchanged; a single sample is broadcast.
pub fn resample_linear(source: &[f32], target_len: usize) -> Vec<f32> {
    if source.len() == target_len {
        return source.to_vec();
    }
    if target_len == 0 {
        return Vec::new();
    }
    match source.len() {
        0 => return vec![0.0; target_len],
        1 => return vec![source[0]; target_len],
        _ => {}
    }

    let last = (source.len() - 1) as f64;
    let step = if target_len > 1 {
        last / (target_len - 1) as f64
    } else {
        0.0
    };

    (0..target_len)
        .map(|i| {
            let pos = (i as f64 * step).min(last);
            let left = pos.floor() as usize;
            let right = (left + 1).min(source.len() - 1);
            let frac = (pos - left as f64) as f32;
            source[left] + (source[right] - source[left]) * frac
        })
        .collect()
}

/// Resample a byte curve, rounding interpolated values back into `[0, 255]`
pub fn resample_bytes(source: &[u8], target_len: usize) -> Vec<u8> {
    if source.len() == target_len {
        return source.to_vec();
    }
    let widened: Vec<f32> = source.iter().map(|&v| v as f32).collect();
    resample_linear(&widened, target_len)
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_length_is_identity() {
        let s = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(resample_linear(&s, 5), s);
    }

    #[test]
    fn test_output_length_is_exact() {
        let s: Vec<f32> = (0..37).map(|i| i as f32).collect();
        for n in [1, 2, 10, 36, 38, 1000] {
            assert_eq!(resample_linear(&s, n).len(), n);
        }
    }

    #[test]
    fn test_upsample_interpolates() {
        let out = resample_linear(&[0.0, 10.0], 5);
        assert_eq!(out, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let s: Vec<f32> = (0..101).map(|i| i as f32).collect();
        let out = resample_linear(&s, 11);
        assert_eq!(out.first(), Some(&0.0));
        assert_eq!(out.last(), Some(&100.0));
        assert!((out[5] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_sample_broadcasts() {
        assert_eq!(resample_linear(&[7.0], 4), vec![7.0; 4]);
    }

    #[test]
    fn test_idempotent_at_fixed_length() {
        let s: Vec<f32> = (0..23).map(|i| (i as f32 * 0.7).sin()).collect();
        let once = resample_linear(&s, 64);
        assert_eq!(resample_linear(&once, 64), once);
    }

    #[test]
    fn test_byte_resample_rounds_and_clamps() {
        let out = resample_bytes(&[0, 255], 3);
        assert_eq!(out, vec![0, 128, 255]);
        assert_eq!(resample_bytes(&[9, 9, 9], 3), vec![9, 9, 9]);
    }
}

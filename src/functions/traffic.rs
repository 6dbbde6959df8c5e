use crate::navigation::{Severity, TrafficSegment};
use crate::utils::GeoCoordinate;
use rand::Rng;
use rayon::prelude::*;

pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Divide un camino en tramos de tráfico simulado.
///
/// Cada tramo comparte su último punto con el primero del siguiente para que
/// las polilíneas dibujadas no tengan huecos. La severidad es aleatoria: no
/// hay un feed real de tráfico detrás.
#[derive(Debug, Clone, Copy)]
pub struct TrafficSegmenter {
    chunk_size: usize,
}

impl Default for TrafficSegmenter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TrafficSegmenter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn segment(&self, path: &[GeoCoordinate]) -> Vec<TrafficSegment> {
        self.segment_with(path, &mut rand::thread_rng())
    }

    pub fn segment_with<R: Rng + ?Sized>(&self, path: &[GeoCoordinate], rng: &mut R) -> Vec<TrafficSegment> {
        if path.len() <= 2 {
            return Vec::new();
        }

        let last = path.len() - 1;
        // Nunca se abre un tramo en el último punto
        let starts: Vec<usize> = (0..last).step_by(self.chunk_size).collect();
        let severities: Vec<Severity> = starts.iter().map(|_| draw_severity(&mut *rng)).collect();
        let chunk_size = self.chunk_size;

        starts
            .par_iter()
            .zip(severities.par_iter())
            .map(|(&start, &severity)| {
                let end = (start + chunk_size).min(last);
                TrafficSegment {
                    points: path[start..=end].to_vec(),
                    severity,
                }
            })
            .collect()
    }
}

/// ~20% congestionado, ~20% lento, ~60% despejado.
fn draw_severity<R: Rng + ?Sized>(rng: &mut R) -> Severity {
    let r: f64 = rng.gen();
    if r < 0.2 {
        Severity::Congested
    } else if r < 0.4 {
        Severity::Slow
    } else {
        Severity::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn path(n: usize) -> Vec<GeoCoordinate> {
        (0..n)
            .map(|i| GeoCoordinate::new(59.0 + i as f64 * 0.001, 18.0).unwrap())
            .collect()
    }

    #[test]
    fn test_short_paths_produce_no_segments() {
        let segmenter = TrafficSegmenter::default();
        assert!(segmenter.segment(&path(0)).is_empty());
        assert!(segmenter.segment(&path(1)).is_empty());
        assert!(segmenter.segment(&path(2)).is_empty());
        assert_eq!(segmenter.segment(&path(3)).len(), 1);
    }

    #[test]
    fn test_45_points_give_3_overlapping_segments() {
        let p = path(45);
        let segments = TrafficSegmenter::new(20).segment_with(&p, &mut StdRng::seed_from_u64(7));

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].points.len(), 21);
        assert_eq!(segments[1].points.len(), 21);
        assert_eq!(segments[2].points.len(), 5);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].points.last(), pair[1].points.first());
        }
        assert_eq!(segments[0].points[0], p[0]);
        assert_eq!(segments[2].points.last(), p.last());
    }

    #[test]
    fn test_no_single_point_tail() {
        // 41 puntos: el tercer tramo empezaría en el último punto
        let segments = TrafficSegmenter::new(20).segment(&path(41));
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.points.len() >= 2));
    }

    #[test]
    fn test_segments_cover_whole_path() {
        let p = path(200);
        let segments = TrafficSegmenter::new(20).segment(&p);
        let covered: usize = segments.iter().map(|s| s.points.len() - 1).sum();
        assert_eq!(covered, p.len() - 1);
    }

    #[test]
    fn test_severity_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 10_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            match draw_severity(&mut rng) {
                Severity::Congested => counts[0] += 1,
                Severity::Slow => counts[1] += 1,
                Severity::Clear => counts[2] += 1,
            }
        }
        let share = |c: usize| c as f64 / n as f64;
        assert!((share(counts[0]) - 0.2).abs() < 0.03, "{counts:?}");
        assert!((share(counts[1]) - 0.2).abs() < 0.03, "{counts:?}");
        assert!((share(counts[2]) - 0.6).abs() < 0.03, "{counts:?}");
    }
}

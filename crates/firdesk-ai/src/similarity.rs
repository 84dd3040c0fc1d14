//! Vector helpers shared by the matcher and the ONNX embedder.

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// L2-normalize a vector in place.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Index and score of the highest-scoring candidate.
///
/// Ties resolve to the earliest position: a later candidate only wins with a
/// strictly greater score. NaN scores never win.
pub fn first_max(query: &[f32], candidates: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let sim = cosine_similarity(query, candidate);
        if sim.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, best_sim)| sim > best_sim) {
            best = Some((i, sim));
        }
    }
    best
}

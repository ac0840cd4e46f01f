use log::{debug, info, warn};

use super::similarity::code_similarity;
use super::window::RollingWindow;
use super::{DuplicateCheck, SignatureCheck};
use crate::config::CycleConfig;
use crate::domain::{PatchRecord, SignatureSet};

/// Everything the detector remembers between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleState {
    last_patch: Option<PatchRecord>,
    signatures: RollingWindow<SignatureSet>,
    fingerprints: RollingWindow<String>,
}

impl CycleState {
    fn new(window_size: usize) -> Self {
        Self {
            last_patch: None,
            signatures: RollingWindow::new(window_size),
            fingerprints: RollingWindow::new(window_size),
        }
    }

    pub fn last_patch(&self) -> Option<&PatchRecord> {
        self.last_patch.as_ref()
    }

    pub fn signature_window(&self) -> &RollingWindow<SignatureSet> {
        &self.signatures
    }

    pub fn fingerprint_window(&self) -> &RollingWindow<String> {
        &self.fingerprints
    }

    fn reset(&mut self) {
        self.last_patch = None;
        self.signatures.clear();
        self.fingerprints.clear();
    }
}

#[derive(Debug, Clone)]
pub struct CycleDetector {
    state: CycleState,
    config: CycleConfig,
}

impl CycleDetector {
    pub fn new(config: CycleConfig) -> Self {
        Self {
            state: CycleState::new(config.window_size),
            config,
        }
    }

    pub fn window_size(&self) -> usize {
        self.state.signatures.capacity()
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn reset(&mut self) {
        debug!("cycle detector reset");
        self.state.reset();
    }

    /// Compare `candidate` with the previous patch. Called before applying it.
    ///
    /// The candidate becomes the new "last patch" whatever the verdict.
    pub fn check_duplicate_patch(&mut self, candidate: &PatchRecord) -> DuplicateCheck {
        let verdict = match &self.state.last_patch {
            None => DuplicateCheck::First,
            Some(last) if !last.same_location(candidate) => DuplicateCheck::DifferentLocation,
            Some(last) if last.new_text().trim() == candidate.new_text().trim() => {
                warn!("Exact duplicate patch detected at {}", candidate);
                DuplicateCheck::ExactDuplicate {
                    file_path: candidate.file_path().to_string(),
                    line_range: candidate.line_range(),
                }
            }
            Some(last) => self.classify(code_similarity(last.new_text(), candidate.new_text())),
        };

        self.state.last_patch = Some(candidate.clone());
        verdict
    }

    fn classify(&self, similarity: f64) -> DuplicateCheck {
        if similarity > self.config.refinement_threshold {
            info!("Semantic refinement detected (similarity: {:.2})", similarity);
            DuplicateCheck::Refinement { similarity }
        } else if similarity > self.config.distinct_threshold {
            info!("Different approach detected (similarity: {:.2})", similarity);
            DuplicateCheck::DistinctApproach { similarity }
        } else {
            debug!("Unrelated patch at same location (similarity: {:.2})", similarity);
            DuplicateCheck::Divergent { similarity }
        }
    }

    /// Report a cycle if this exact failure set is already in the window,
    /// otherwise remember it.
    pub fn check_signature_cycle(&mut self, current: &SignatureSet) -> SignatureCheck {
        if self.state.signatures.contains(current) {
            warn!("Signature cycle detected: {}", current);
            return SignatureCheck::CycleDetected {
                signatures: current.clone(),
            };
        }
        self.state.signatures.push(current.clone());
        SignatureCheck::Progress
    }

    /// Record the outcome of one iteration.
    pub fn update_history(&mut self, patch: &PatchRecord, signatures: &SignatureSet) {
        self.state.fingerprints.push(patch.fingerprint());
        self.state.signatures.push(signatures.clone());
        self.state.last_patch = Some(patch.clone());
    }

    /// First block of `length` signature sets in the window that is
    /// immediately repeated.
    pub fn detect_pattern(&self, length: usize) -> Option<Vec<SignatureSet>> {
        let span = length.checked_mul(2)?;
        if length == 0 {
            return None;
        }
        let history: Vec<&SignatureSet> = self.state.signatures.iter().collect();
        if history.len() < span {
            return None;
        }
        (0..=history.len() - span)
            .find(|&i| history[i..i + length] == history[i + length..i + span])
            .map(|i| history[i..i + length].iter().map(|s| (*s).clone()).collect())
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(CycleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureSignature, LineRange};

    fn patch(file: &str, start: usize, end: usize, new: &str) -> PatchRecord {
        PatchRecord::new(file, LineRange::new(start, end).unwrap(), "old", new)
    }

    fn sigs(names: &[&str]) -> SignatureSet {
        names.iter().map(|n| FailureSignature::new("test.py", *n, "AssertionError")).collect()
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("line_{}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_first_patch_is_not_duplicate() {
        let mut detector = CycleDetector::default();
        let p = patch("calc.py", 2, 2, "return a + b");
        assert_eq!(detector.check_duplicate_patch(&p), DuplicateCheck::First);
        assert_eq!(detector.state().last_patch(), Some(&p));
    }

    #[test]
    fn test_exact_duplicate_second_time() {
        let mut detector = CycleDetector::default();
        let p = patch("calc.py", 2, 2, "return a + b");
        assert!(!detector.check_duplicate_patch(&p).is_duplicate());
        assert!(detector.check_duplicate_patch(&p).is_duplicate());
    }

    #[test]
    fn test_exact_duplicate_ignores_surrounding_whitespace() {
        let mut detector = CycleDetector::default();
        detector.check_duplicate_patch(&patch("calc.py", 2, 2, "return a + b"));
        let verdict = detector.check_duplicate_patch(&patch("calc.py", 2, 2, "  return a + b\n"));
        assert!(verdict.is_duplicate());
    }

    #[test]
    fn test_different_location() {
        let mut detector = CycleDetector::default();
        detector.check_duplicate_patch(&patch("calc.py", 2, 2, "x"));
        assert_eq!(
            detector.check_duplicate_patch(&patch("calc.py", 3, 3, "x")),
            DuplicateCheck::DifferentLocation
        );
        assert_eq!(
            detector.check_duplicate_patch(&patch("other.py", 3, 3, "x")),
            DuplicateCheck::DifferentLocation
        );
    }

    #[test]
    fn test_refinements_are_not_duplicates() {
        let mut detector = CycleDetector::default();
        detector.check_duplicate_patch(&patch("calc.py", 1, 20, &lines(19)));

        let verdict = detector.check_duplicate_patch(&patch("calc.py", 1, 20, &lines(20)));
        assert_eq!(verdict, DuplicateCheck::Refinement { similarity: 0.95 });

        let verdict = detector.check_duplicate_patch(&patch("calc.py", 1, 20, &lines(19)));
        assert_eq!(verdict, DuplicateCheck::Refinement { similarity: 0.95 });
    }

    #[test]
    fn test_distinct_and_divergent() {
        let mut detector = CycleDetector::default();
        detector.check_duplicate_patch(&patch("calc.py", 1, 1, &lines(4)));
        // {0,1,2,3} vs {0,1,2}: 0.75
        assert_eq!(
            detector.check_duplicate_patch(&patch("calc.py", 1, 1, &lines(3))),
            DuplicateCheck::DistinctApproach { similarity: 0.75 }
        );
        assert!(matches!(
            detector.check_duplicate_patch(&patch("calc.py", 1, 1, "something_else")),
            DuplicateCheck::Divergent { .. }
        ));
    }

    #[test]
    fn test_signature_cycle() {
        let mut detector = CycleDetector::default();
        assert_eq!(detector.check_signature_cycle(&sigs(&["a"])), SignatureCheck::Progress);
        assert_eq!(detector.check_signature_cycle(&sigs(&["b"])), SignatureCheck::Progress);
        assert!(detector.check_signature_cycle(&sigs(&["a"])).is_cycle());
    }

    #[test]
    fn test_signature_cycle_is_order_independent() {
        let mut detector = CycleDetector::default();
        detector.check_signature_cycle(&sigs(&["a", "b"]));
        assert!(detector.check_signature_cycle(&sigs(&["b", "a"])).is_cycle());
    }

    #[test]
    fn test_signature_window_is_bounded() {
        let mut detector = CycleDetector::default();
        for i in 0..10 {
            let name = format!("f{}", i);
            detector.check_signature_cycle(&sigs(&[name.as_str()]));
        }
        assert_eq!(detector.state().signature_window().len(), 4);
        // f0 fell out of the window, so it no longer counts as a cycle.
        assert!(!detector.check_signature_cycle(&sigs(&["f0"])).is_cycle());
    }

    #[test]
    fn test_repeated_set_never_grows_window() {
        let mut detector = CycleDetector::default();
        for _ in 0..10 {
            detector.check_signature_cycle(&sigs(&["a"]));
        }
        assert_eq!(detector.state().signature_window().len(), 1);
    }

    #[test]
    fn test_update_history() {
        let mut detector = CycleDetector::new(CycleConfig {
            window_size: 2,
            ..Default::default()
        });
        for i in 0..5 {
            let p = patch("calc.py", 1, 1, &format!("v{}", i));
            let name = format!("f{}", i);
            detector.update_history(&p, &sigs(&[name.as_str()]));
        }
        let state = detector.state();
        assert_eq!(state.signature_window().len(), 2);
        assert_eq!(state.fingerprint_window().len(), 2);
        assert_eq!(state.last_patch().map(|p| p.new_text()), Some("v4"));
        assert_eq!(
            state.fingerprint_window().latest(),
            Some(&patch("calc.py", 1, 1, "v4").fingerprint())
        );
    }

    #[test]
    fn test_detect_pattern() {
        let mut detector = CycleDetector::new(CycleConfig {
            window_size: 6,
            ..Default::default()
        });
        let p = patch("calc.py", 1, 1, "x");
        for name in ["a", "b", "a", "b"] {
            detector.update_history(&p, &sigs(&[name]));
        }
        assert_eq!(detector.detect_pattern(2), Some(vec![sigs(&["a"]), sigs(&["b"])]));
        assert_eq!(detector.detect_pattern(3), None);
        assert_eq!(detector.detect_pattern(0), None);
    }

    #[test]
    fn test_detect_pattern_huge_length() {
        let mut detector = CycleDetector::default();
        detector.update_history(&patch("calc.py", 1, 1, "x"), &sigs(&["a"]));
        assert_eq!(detector.detect_pattern(usize::MAX), None);
        assert_eq!(detector.detect_pattern(usize::MAX / 2 + 1), None);
    }

    #[test]
    fn test_reset() {
        let mut detector = CycleDetector::default();
        detector.update_history(&patch("calc.py", 1, 1, "x"), &sigs(&["a"]));
        detector.reset();
        assert!(detector.state().last_patch().is_none());
        assert!(detector.state().signature_window().is_empty());
        assert!(detector.state().fingerprint_window().is_empty());
        assert_eq!(detector.window_size(), 4);
    }
}

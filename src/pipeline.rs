//! Current sequence plus undo/redo history.

use std::mem;

use tracing::debug;

use crate::value::Value;

/// Owns the current result, the loaded data and both history stacks.
///
/// Every mutation goes through [`Pipeline::update_result`], which snapshots
/// the previous sequence onto the undo stack and clears the redo stack.
#[derive(Debug, Clone)]
pub struct Pipeline {
    original: Vec<Value>,
    current: Vec<Value>,
    undo: Vec<Vec<Value>>,
    redo: Vec<Vec<Value>>,
}

impl Pipeline {
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            current: data.clone(),
            original: data,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn current(&self) -> &[Value] {
        &self.current
    }

    pub fn original(&self) -> &[Value] {
        &self.original
    }

    /// Replace the current sequence, recording the old one for undo.
    pub fn update_result(&mut self, next: Vec<Value>) {
        let previous = mem::replace(&mut self.current, next);
        self.undo.push(previous);
        self.redo.clear();
        debug!(
            items = self.current.len(),
            undo_depth = self.undo.len(),
            "updated result"
        );
    }

    /// Step back one mutation. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let superseded = mem::replace(&mut self.current, previous);
        self.redo.push(superseded);
        true
    }

    /// Reapply the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let superseded = mem::replace(&mut self.current, next);
        self.undo.push(superseded);
        true
    }

    /// Back to the loaded data with empty history.
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.current = self.original.clone();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn test_update_pushes_undo_and_clears_redo() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3]));
        pipeline.update_result(ints(&[2, 3]));
        assert!(pipeline.undo());
        assert_eq!(pipeline.redo_depth(), 1);

        pipeline.update_result(ints(&[1]));
        assert_eq!(pipeline.redo_depth(), 0);
        assert_eq!(pipeline.undo_depth(), 1);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3]));
        pipeline.update_result(ints(&[3, 2, 1]));
        pipeline.update_result(ints(&[3]));

        assert!(pipeline.undo());
        assert_eq!(pipeline.current(), ints(&[3, 2, 1]).as_slice());
        assert!(pipeline.undo());
        assert_eq!(pipeline.current(), ints(&[1, 2, 3]).as_slice());
        assert!(!pipeline.undo());

        assert!(pipeline.redo());
        assert_eq!(pipeline.current(), ints(&[3, 2, 1]).as_slice());
        assert!(pipeline.redo());
        assert_eq!(pipeline.current(), ints(&[3]).as_slice());
        assert!(!pipeline.redo());
    }

    #[test]
    fn test_reset_restores_original() {
        let mut pipeline = Pipeline::new(ints(&[5, 6]));
        pipeline.update_result(ints(&[]));
        pipeline.update_result(ints(&[7]));
        pipeline.undo();

        pipeline.reset();
        assert_eq!(pipeline.current(), pipeline.original());
        assert_eq!(pipeline.undo_depth(), 0);
        assert_eq!(pipeline.redo_depth(), 0);
    }
}

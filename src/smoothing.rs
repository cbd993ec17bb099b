//! View debouncing across ticks.
//!
//! Landmark noise near a classification boundary can flip the view every
//! tick. [`ViewDebouncer`] only switches the committed view after the same
//! new label has been observed for a number of consecutive ticks.

use crate::classifier::ViewLabel;

/// Hysteresis over classifier output
#[derive(Debug, Clone)]
pub struct ViewDebouncer {
    required: usize,
    committed: Option<ViewLabel>,
    candidate: Option<ViewLabel>,
    streak: usize,
}

impl ViewDebouncer {
    /// `required` consecutive ticks are needed to switch; 0 and 1 disable smoothing
    #[must_use]
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            committed: None,
            candidate: None,
            streak: 0,
        }
    }

    /// Feed one tick's classification and get the view to draw.
    ///
    /// A tick without a confident view still yields `None`; the committed view
    /// is kept for when the body is found again.
    pub fn update(&mut self, observed: Option<ViewLabel>) -> Option<ViewLabel> {
        let Some(view) = observed else {
            self.candidate = None;
            self.streak = 0;
            return None;
        };

        match self.committed {
            None => {
                self.committed = Some(view);
            }
            Some(current) if current == view => {
                self.candidate = None;
                self.streak = 0;
            }
            Some(_) => {
                if self.candidate == Some(view) {
                    self.streak += 1;
                } else {
                    self.candidate = Some(view);
                    self.streak = 1;
                }
                if self.streak >= self.required {
                    self.committed = Some(view);
                    self.candidate = None;
                    self.streak = 0;
                }
            }
        }

        self.committed
    }

    /// Currently committed view
    #[must_use]
    pub fn committed(&self) -> Option<ViewLabel> {
        self.committed
    }

    /// Reset debouncer state
    pub fn reset(&mut self) {
        self.committed = None;
        self.candidate = None;
        self.streak = 0;
    }
}

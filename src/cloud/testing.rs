use super::surface::{ConfigSurface, ImportAction, SurfaceFactory};
use crate::error::Result;
use eframe::egui;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct NullSurface {
    pub torn_down: Rc<RefCell<bool>>,
}

impl ConfigSurface for NullSurface {
    fn show(&mut self, _ui: &mut egui::Ui) {}

    fn teardown(&mut self) {
        *self.torn_down.borrow_mut() = true;
    }
}

/// Hands out surfaces that do nothing, keeping their actions so tests can
/// trigger imports directly.
#[derive(Clone, Default)]
pub(crate) struct CapturingFactory {
    pub instantiated: Rc<RefCell<Vec<(String, ImportAction)>>>,
    pub torn_down: Rc<RefCell<bool>>,
}

impl CapturingFactory {
    pub fn paths(&self) -> Vec<String> {
        self.instantiated
            .borrow()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn action(&self, index: usize) -> ImportAction {
        self.instantiated.borrow()[index].1.clone()
    }
}

impl SurfaceFactory for CapturingFactory {
    fn instantiate(
        &self,
        component_path: &str,
        action: ImportAction,
    ) -> Result<Box<dyn ConfigSurface>> {
        self.instantiated
            .borrow_mut()
            .push((component_path.to_string(), action));
        Ok(Box::new(NullSurface {
            torn_down: self.torn_down.clone(),
        }))
    }
}

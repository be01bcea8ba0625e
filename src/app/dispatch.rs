use std::cell::RefCell;
use std::rc::Rc;

/// What activating a node should do, decided from the state current at click time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum NodeCommand {
    Select { id: String, analyze: bool },
    ClearSelection,
}

/// State the activation handler is built from. Refreshed every frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct ActivationContext {
    pub selected: Option<String>,
    pub connected: bool,
}

type Handler = Box<dyn Fn(&str) -> NodeCommand>;

fn handler_for(context: ActivationContext) -> Handler {
    Box::new(move |id: &str| {
        if context.selected.as_deref() == Some(id) {
            NodeCommand::ClearSelection
        } else {
            NodeCommand::Select {
                id: id.to_owned(),
                analyze: context.connected,
            }
        }
    })
}

/// Single owner of the current node-activation handler. Confined to the UI thread.
pub(in crate::app) struct Dispatcher {
    cell: Rc<RefCell<Handler>>,
    context: ActivationContext,
}

impl Default for Dispatcher {
    fn default() -> Self {
        let context = ActivationContext::default();
        Self {
            cell: Rc::new(RefCell::new(handler_for(context.clone()))),
            context,
        }
    }
}

impl Dispatcher {
    /// Replaces the handler when the context changed since the last frame.
    pub fn refresh(&mut self, context: ActivationContext) {
        if context == self.context {
            return;
        }
        *self.cell.borrow_mut() = handler_for(context.clone());
        self.context = context;
    }

    /// A click target that always routes through the newest handler.
    pub fn target(&self) -> ClickTarget {
        ClickTarget {
            cell: Rc::clone(&self.cell),
        }
    }
}

/// Attached to the rendered graph when it is rebuilt; outlives many handler refreshes.
#[derive(Clone)]
pub(in crate::app) struct ClickTarget {
    cell: Rc<RefCell<Handler>>,
}

impl ClickTarget {
    pub fn activate(&self, id: &str) -> NodeCommand {
        let handler = self.cell.borrow();
        handler(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_created_before_refresh_sees_latest_state() {
        let mut dispatcher = Dispatcher::default();
        let target = dispatcher.target();

        assert_eq!(
            target.activate("orders"),
            NodeCommand::Select {
                id: "orders".into(),
                analyze: false
            }
        );

        dispatcher.refresh(ActivationContext {
            selected: Some("orders".into()),
            connected: true,
        });
        assert_eq!(target.activate("orders"), NodeCommand::ClearSelection);
        assert_eq!(
            target.activate("payments"),
            NodeCommand::Select {
                id: "payments".into(),
                analyze: true
            }
        );

        dispatcher.refresh(ActivationContext::default());
        assert_eq!(
            target.activate("orders"),
            NodeCommand::Select {
                id: "orders".into(),
                analyze: false
            }
        );
    }
}

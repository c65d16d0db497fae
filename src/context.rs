//! Ambient rendering context.
//!
//! While a screen composites on top of other screens, widgets may need to
//! sample the screens behind them (e.g. for translucent backgrounds). The
//! stack of background screens is ambient state: it is installed for the
//! duration of one render call and read from within widget `render_lines`
//! implementations, without threading it through every signature.

use std::cell::RefCell;

use crate::widget::WidgetRef;

thread_local! {
    static VISIBLE_SCREEN_STACK: RefCell<Vec<WidgetRef>> = const { RefCell::new(Vec::new()) };
}

/// The background screens visible beneath the screen currently rendering.
///
/// Empty outside of a render call.
pub fn visible_screen_stack() -> Vec<WidgetRef> {
    VISIBLE_SCREEN_STACK.with(|stack| stack.borrow().clone())
}

/// Installs a background-screen stack for the current thread, restoring
/// the previous stack when dropped.
///
/// The guard restores on every exit path, including unwinding out of a
/// widget's render.
#[must_use = "the stack is uninstalled when the guard drops"]
pub struct ScreenStackGuard {
    previous: Vec<WidgetRef>,
}

impl ScreenStackGuard {
    pub fn install(screens: Vec<WidgetRef>) -> Self {
        let previous =
            VISIBLE_SCREEN_STACK.with(|stack| std::mem::replace(&mut *stack.borrow_mut(), screens));
        Self { previous }
    }
}

impl Drop for ScreenStackGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        VISIBLE_SCREEN_STACK.with(|stack| *stack.borrow_mut() = previous);
    }
}

use winit::event::WindowEvent;

/// One slice of application behavior in a [`LayerStack`].
///
/// `C` is the state shared by every layer of the stack. All hooks but
/// [`name`](Self::name) default to doing nothing.
pub trait Layer<C> {
    fn name(&self) -> &str;

    /// Called when the layer is pushed.
    fn on_attach(&mut self, cx: &mut C) {
        let _ = cx;
    }

    /// Called when the layer is popped or the stack is cleared.
    fn on_detach(&mut self, cx: &mut C) {
        let _ = cx;
    }

    /// Fixed-rate update; `dt` is the step length in seconds.
    fn on_update(&mut self, cx: &mut C, dt: f32) {
        let _ = (cx, dt);
    }

    /// Render hook; `alpha` is the progress towards the next update in `[0, 1)`.
    fn on_render(&mut self, cx: &mut C, alpha: f32) {
        let _ = (cx, alpha);
    }

    /// Returns `true` when the event is consumed; layers below do not see it.
    fn on_event(&mut self, cx: &mut C, event: &WindowEvent) -> bool {
        let _ = (cx, event);
        false
    }
}

/// Ordered layers, bottom first.
///
/// Updates and renders run bottom to top, so upper layers draw over lower
/// ones. Events run top to bottom and stop at the first layer that consumes
/// them.
pub struct LayerStack<C> {
    layers: Vec<Box<dyn Layer<C>>>,
}

impl<C> LayerStack<C> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Attaches `layer` on top of the stack.
    pub fn push(&mut self, cx: &mut C, mut layer: Box<dyn Layer<C>>) {
        log::debug!("layer attached: {}", layer.name());
        layer.on_attach(cx);
        self.layers.push(layer);
    }

    /// Detaches and returns the top layer.
    pub fn pop(&mut self, cx: &mut C) -> Option<Box<dyn Layer<C>>> {
        let mut layer = self.layers.pop()?;
        layer.on_detach(cx);
        log::debug!("layer detached: {}", layer.name());
        Some(layer)
    }

    /// Detaches every layer, top first.
    pub fn clear(&mut self, cx: &mut C) {
        while self.pop(cx).is_some() {}
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn update(&mut self, cx: &mut C, dt: f32) {
        for layer in &mut self.layers {
            layer.on_update(cx, dt);
        }
    }

    pub fn render(&mut self, cx: &mut C, alpha: f32) {
        for layer in &mut self.layers {
            layer.on_render(cx, alpha);
        }
    }

    /// Offers `event` to each layer from the top. Returns `true` if one consumed it.
    pub fn dispatch_event(&mut self, cx: &mut C, event: &WindowEvent) -> bool {
        self.layers
            .iter_mut()
            .rev()
            .any(|layer| layer.on_event(cx, event))
    }
}

impl<C> Default for LayerStack<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal(Vec<String>);

    struct Recorder {
        name: &'static str,
        consumes: bool,
    }

    impl Recorder {
        fn boxed(name: &'static str, consumes: bool) -> Box<dyn Layer<Journal>> {
            Box::new(Self { name, consumes })
        }
    }

    impl Layer<Journal> for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_attach(&mut self, cx: &mut Journal) {
            cx.0.push(format!("attach {}", self.name));
        }

        fn on_detach(&mut self, cx: &mut Journal) {
            cx.0.push(format!("detach {}", self.name));
        }

        fn on_update(&mut self, cx: &mut Journal, dt: f32) {
            cx.0.push(format!("update {} {dt}", self.name));
        }

        fn on_render(&mut self, cx: &mut Journal, alpha: f32) {
            cx.0.push(format!("render {} {alpha}", self.name));
        }

        fn on_event(&mut self, cx: &mut Journal, _event: &WindowEvent) -> bool {
            cx.0.push(format!("event {}", self.name));
            self.consumes
        }
    }

    struct Silent;

    impl Layer<Journal> for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    fn stack(layers: &[(&'static str, bool)]) -> (LayerStack<Journal>, Journal) {
        let mut cx = Journal::default();
        let mut stack: LayerStack<Journal> = LayerStack::new();
        for &(name, consumes) in layers {
            stack.push(&mut cx, Recorder::boxed(name, consumes));
        }
        cx.0.clear();
        (stack, cx)
    }

    #[test]
    fn push_attaches_and_pop_detaches() {
        let mut cx = Journal::default();
        let mut stack: LayerStack<Journal> = LayerStack::new();
        stack.push(&mut cx, Recorder::boxed("a", false));
        stack.push(&mut cx, Recorder::boxed("b", false));
        assert_eq!(stack.len(), 2);

        let top = stack.pop(&mut cx).map(|l| l.name().to_string());
        assert_eq!(top.as_deref(), Some("b"));
        assert_eq!(cx.0, vec!["attach a", "attach b", "detach b"]);
    }

    #[test]
    fn update_and_render_run_bottom_to_top() {
        let (mut stack, mut cx) = stack(&[("world", false), ("overlay", false)]);
        stack.update(&mut cx, 0.5);
        stack.render(&mut cx, 0.25);
        assert_eq!(
            cx.0,
            vec![
                "update world 0.5",
                "update overlay 0.5",
                "render world 0.25",
                "render overlay 0.25",
            ]
        );
    }

    #[test]
    fn events_run_top_down_and_stop_when_consumed() {
        let (mut stack, mut cx) = stack(&[("base", false), ("middle", true), ("top", false)]);
        let consumed = stack.dispatch_event(&mut cx, &WindowEvent::Focused(true));
        assert!(consumed);
        assert_eq!(cx.0, vec!["event top", "event middle"]);
    }

    #[test]
    fn unconsumed_events_reach_every_layer() {
        let (mut stack, mut cx) = stack(&[("base", false), ("top", false)]);
        assert!(!stack.dispatch_event(&mut cx, &WindowEvent::Focused(false)));
        assert_eq!(cx.0, vec!["event top", "event base"]);
    }

    #[test]
    fn clear_detaches_top_first() {
        let (mut stack, mut cx) = stack(&[("a", false), ("b", false), ("c", false)]);
        stack.clear(&mut cx);
        assert!(stack.is_empty());
        assert_eq!(cx.0, vec!["detach c", "detach b", "detach a"]);
        assert!(stack.pop(&mut cx).is_none());
    }

    #[test]
    fn default_hooks_do_nothing() {
        let mut cx = Journal::default();
        let mut stack: LayerStack<Journal> = LayerStack::new();
        stack.push(&mut cx, Box::new(Silent));
        stack.update(&mut cx, 1.0);
        stack.render(&mut cx, 0.0);
        assert!(!stack.dispatch_event(&mut cx, &WindowEvent::Focused(true)));
        stack.clear(&mut cx);
        assert!(cx.0.is_empty());
    }
}

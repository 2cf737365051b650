use portal_common::HexColor;

/// A numeric control bound to one `f32` field of `T`.
pub struct SliderBinding<T> {
    pub label: &'static str,
    get: fn(&T) -> f32,
    set: fn(&mut T, f32),
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl<T> SliderBinding<T> {
    pub fn new(label: &'static str, get: fn(&T) -> f32, set: fn(&mut T, f32)) -> Self {
        Self {
            label,
            get,
            set,
            min: f32::MIN,
            max: f32::MAX,
            step: 0.0,
        }
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn get(&self, target: &T) -> f32 {
        (self.get)(target)
    }

    /// Snap to the step, clamp into range, write, and return what was written.
    /// NaN leaves the target untouched.
    pub fn set(&self, target: &mut T, value: f32) -> f32 {
        if value.is_nan() {
            return self.get(target);
        }
        let value = self.constrain(value);
        (self.set)(target, value);
        value
    }

    pub fn constrain(&self, value: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

/// A color control bound to one sRGB color of `T`. The optional change
/// callback propagates the write into derived state and may return an
/// effect for the host to apply (something that is not a plain field).
pub struct ColorBinding<T, E> {
    pub label: &'static str,
    get: fn(&T) -> HexColor,
    set: fn(&mut T, HexColor),
    on_change: Option<fn(&mut T) -> Option<E>>,
}

impl<T, E> ColorBinding<T, E> {
    pub fn new(label: &'static str, get: fn(&T) -> HexColor, set: fn(&mut T, HexColor)) -> Self {
        Self {
            label,
            get,
            set,
            on_change: None,
        }
    }

    pub fn on_change(mut self, callback: fn(&mut T) -> Option<E>) -> Self {
        self.on_change = Some(callback);
        self
    }

    pub fn get(&self, target: &T) -> HexColor {
        (self.get)(target)
    }

    pub fn set(&self, target: &mut T, value: HexColor) -> Option<E> {
        (self.set)(target, value);
        self.on_change.and_then(|callback| callback(target))
    }
}

pub enum Control<T, E> {
    Slider(SliderBinding<T>),
    Color(ColorBinding<T, E>),
}

impl<T, E> Control<T, E> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Slider(s) => s.label,
            Self::Color(c) => c.label,
        }
    }
}

/// A titled, collapsible group of controls.
pub struct Folder<T, E> {
    pub title: &'static str,
    pub open: bool,
    pub controls: Vec<Control<T, E>>,
}

impl<T, E> Folder<T, E> {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            open: true,
            controls: Vec::new(),
        }
    }

    pub fn close(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn add(mut self, control: Control<T, E>) -> Self {
        self.controls.push(control);
        self
    }
}

/// Top-level panel entries, kept in insertion order.
pub enum PanelEntry<T, E> {
    Control(Control<T, E>),
    Folder(Folder<T, E>),
}

/// Errors from addressing a control by label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("no control labelled {0:?}")]
    UnknownControl(String),
    #[error("control {label:?} is not a {expected} control")]
    WrongKind {
        label: String,
        expected: &'static str,
    },
}

/// A floating debug panel over target state `T`, producing effects `E`.
pub struct DebugPanel<T, E> {
    pub title: &'static str,
    /// Panel width in logical pixels.
    pub width: f32,
    pub entries: Vec<PanelEntry<T, E>>,
}

impl<T, E> DebugPanel<T, E> {
    pub fn new(title: &'static str, width: f32) -> Self {
        Self {
            title,
            width,
            entries: Vec::new(),
        }
    }

    pub fn add(mut self, control: Control<T, E>) -> Self {
        self.entries.push(PanelEntry::Control(control));
        self
    }

    pub fn add_folder(mut self, folder: Folder<T, E>) -> Self {
        self.entries.push(PanelEntry::Folder(folder));
        self
    }

    /// Every control, folders flattened, in display order.
    pub fn controls(&self) -> impl Iterator<Item = &Control<T, E>> {
        self.entries.iter().flat_map(|entry| match entry {
            PanelEntry::Control(c) => std::slice::from_ref(c).iter(),
            PanelEntry::Folder(f) => f.controls.iter(),
        })
    }

    pub fn control(&self, label: &str) -> Option<&Control<T, E>> {
        self.controls().find(|c| c.label() == label)
    }

    pub fn folder(&self, title: &str) -> Option<&Folder<T, E>> {
        self.entries.iter().find_map(|entry| match entry {
            PanelEntry::Folder(f) if f.title == title => Some(f),
            _ => None,
        })
    }

    /// Write a number through the slider labelled `label`, as a user drag would.
    pub fn set_number(&self, target: &mut T, label: &str, value: f32) -> Result<f32, PanelError> {
        match self.control(label) {
            Some(Control::Slider(slider)) => {
                let written = slider.set(target, value);
                tracing::debug!("panel: {label} = {written}");
                Ok(written)
            }
            Some(_) => Err(PanelError::WrongKind {
                label: label.to_string(),
                expected: "slider",
            }),
            None => Err(PanelError::UnknownControl(label.to_string())),
        }
    }

    /// Write a color through the color control labelled `label`.
    pub fn set_color(
        &self,
        target: &mut T,
        label: &str,
        value: HexColor,
    ) -> Result<Option<E>, PanelError> {
        match self.control(label) {
            Some(Control::Color(color)) => {
                tracing::debug!("panel: {label} = {value}");
                Ok(color.set(target, value))
            }
            Some(_) => Err(PanelError::WrongKind {
                label: label.to_string(),
                expected: "color",
            }),
            None => Err(PanelError::UnknownControl(label.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Target {
        speed: f32,
        tint: HexColor,
        tint_changes: u32,
    }

    fn panel() -> DebugPanel<Target, u32> {
        DebugPanel::new("Debug", 400.0)
            .add_folder(
                Folder::new("Motion").close().add(Control::Slider(
                    SliderBinding::new(
                        "Speed",
                        |t: &Target| t.speed,
                        |t: &mut Target, v| t.speed = v,
                    )
                    .range(0.2, 2.0)
                    .step(0.01),
                )),
            )
            .add(Control::Color(
                ColorBinding::new(
                    "Tint",
                    |t: &Target| t.tint,
                    |t: &mut Target, v| t.tint = v,
                )
                .on_change(|t: &mut Target| {
                    t.tint_changes += 1;
                    Some(t.tint_changes)
                }),
            ))
    }

    #[test]
    fn slider_clamps_into_range() {
        let panel = panel();
        let mut target = Target::default();
        assert_eq!(panel.set_number(&mut target, "Speed", 7.5).unwrap(), 2.0);
        assert_eq!(target.speed, 2.0);
        assert_eq!(panel.set_number(&mut target, "Speed", -1.0).unwrap(), 0.2);
        assert_eq!(target.speed, 0.2);
    }

    #[test]
    fn slider_snaps_to_step() {
        let panel = panel();
        let mut target = Target::default();
        let written = panel.set_number(&mut target, "Speed", 1.234_9).unwrap();
        assert!((written - 1.23).abs() < 1e-5);
    }

    #[test]
    fn slider_ignores_nan() {
        let panel = panel();
        let mut target = Target {
            speed: 1.0,
            ..Target::default()
        };
        panel.set_number(&mut target, "Speed", f32::NAN).unwrap();
        assert_eq!(target.speed, 1.0);
    }

    #[test]
    fn color_runs_change_callback() {
        let panel = panel();
        let mut target = Target::default();
        let effect = panel
            .set_color(&mut target, "Tint", HexColor([1, 2, 3]))
            .unwrap();
        assert_eq!(effect, Some(1));
        assert_eq!(target.tint, HexColor([1, 2, 3]));
    }

    #[test]
    fn wrong_label_or_kind_is_an_error() {
        let panel = panel();
        let mut target = Target::default();
        assert_eq!(
            panel.set_number(&mut target, "Nope", 1.0),
            Err(PanelError::UnknownControl("Nope".into()))
        );
        assert!(matches!(
            panel.set_number(&mut target, "Tint", 1.0),
            Err(PanelError::WrongKind { .. })
        ));
    }

    #[test]
    fn entries_keep_insertion_order_and_folder_state() {
        let panel = panel();
        let labels: Vec<_> = panel.controls().map(|c| c.label()).collect();
        assert_eq!(labels, ["Speed", "Tint"]);
        assert!(!panel.folder("Motion").unwrap().open);
    }
}

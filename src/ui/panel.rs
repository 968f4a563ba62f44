//! Overlay panels: controls card, disclaimer and the info window

use crate::{
    gfx::{loader::LoadProgress, scene::Scene},
    input::InputMode,
};

const DISCLAIMER: &str = "Reference model for visualisation only. Not to scale.";

const ABOUT: &str = "Stella 3D Viewer renders a single static model with a \
crease and boundary edge overlay. Navigate with the controls listed in the \
bottom-left card.";

/// State of the background model load, shown in the info window
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading(LoadProgress),
    Loaded,
    Failed(String),
}

impl LoadStatus {
    pub fn describe(&self) -> String {
        match self {
            LoadStatus::Idle => "No model".to_string(),
            LoadStatus::Loading(progress) if progress.total > 0 => format!(
                "Loading... {:.0}%",
                progress.loaded as f32 / progress.total as f32 * 100.0
            ),
            LoadStatus::Loading(_) => "Loading...".to_string(),
            LoadStatus::Loaded => "Loaded".to_string(),
            LoadStatus::Failed(message) => format!("Failed: {}", message),
        }
    }
}

#[derive(Debug, Default)]
pub struct UiState {
    pub show_info: bool,
    /// Set when the invert-mouse checkbox was toggled this frame
    pub invert_mouse_changed: bool,
    pub load_status: LoadStatus,
}

/// Key/gesture and action pairs for the active input handler
pub fn control_hints(mode: InputMode) -> &'static [(&'static str, &'static str)] {
    match mode {
        InputMode::Desktop => &[
            ("Click", "Capture mouse"),
            ("Mouse", "Look around"),
            ("W / S", "Forward / back"),
            ("A / D", "Strafe left / right"),
            ("Space / C", "Up / down"),
            ("Shift", "Move faster"),
            ("Esc", "Release mouse, then quit"),
        ],
        InputMode::Touch => &[
            ("One finger", "Rotate"),
            ("Two fingers", "Pan"),
            ("Pinch", "Move forward / back"),
        ],
    }
}

/// Builds every overlay panel for this frame
pub fn viewer_panels(ui: &imgui::Ui, state: &mut UiState, scene: &mut Scene) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    render_controls_card(ui, state, scene, display_size);
    render_disclaimer(ui, display_size);

    if state.show_info {
        render_info_window(ui, state, scene, display_size);
    }
}

fn render_controls_card(
    ui: &imgui::Ui,
    state: &mut UiState,
    scene: &mut Scene,
    display_size: [f32; 2],
) {
    let mode = scene.camera_manager.input_mode();

    ui.window("Controls")
        .position([16.0, display_size[1] - 16.0], imgui::Condition::Always)
        .position_pivot([0.0, 1.0])
        .always_auto_resize(true)
        .resizable(false)
        .movable(false)
        .collapsible(true)
        .bg_alpha(0.75)
        .build(|| {
            ui.columns(2, "control_hints", false);
            for (input, action) in control_hints(mode) {
                ui.text(input);
                ui.next_column();
                ui.text(action);
                ui.next_column();
            }
            ui.columns(1, "", false);

            if let Some(desktop) = scene.camera_manager.controls.desktop_mut() {
                ui.separator();
                if ui.checkbox("Invert mouse", &mut desktop.invert_mouse) {
                    state.invert_mouse_changed = true;
                }
            }

            ui.separator();
            if ui.button("Info") {
                state.show_info = true;
            }
        });
}

fn render_disclaimer(ui: &imgui::Ui, display_size: [f32; 2]) {
    ui.window("##disclaimer")
        .position(
            [display_size[0] - 16.0, display_size[1] - 16.0],
            imgui::Condition::Always,
        )
        .position_pivot([1.0, 1.0])
        .always_auto_resize(true)
        .no_decoration()
        .movable(false)
        .bg_alpha(0.5)
        .build(|| {
            ui.text_disabled(DISCLAIMER);
        });
}

fn render_info_window(ui: &imgui::Ui, state: &mut UiState, scene: &Scene, display_size: [f32; 2]) {
    let stats = scene.statistics();
    let mut opened = true;
    let mut close_clicked = false;

    ui.window("Info")
        .position(
            [display_size[0] * 0.5, display_size[1] * 0.5],
            imgui::Condition::Appearing,
        )
        .position_pivot([0.5, 0.5])
        .always_auto_resize(true)
        .collapsible(false)
        .focused(true)
        .opened(&mut opened)
        .build(|| {
            ui.text_wrapped(ABOUT);
            ui.separator();

            let model = scene
                .model_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            ui.text(format!("Model: {}", model));
            ui.text(format!("Status: {}", state.load_status.describe()));

            ui.separator();
            ui.columns(2, "scene_stats", false);
            for (label, value) in [
                ("Objects", stats.objects),
                ("Triangles", stats.triangles),
                ("Vertices", stats.vertices),
                ("Edge segments", stats.edge_segments),
            ] {
                ui.text(label);
                ui.next_column();
                ui.text(value.to_string());
                ui.next_column();
            }
            ui.columns(1, "", false);

            ui.separator();
            close_clicked = ui.button("Close");
        });

    if !opened || close_clicked {
        state.show_info = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_follow_input_mode() {
        let desktop = control_hints(InputMode::Desktop);
        assert!(desktop.iter().any(|(input, _)| *input == "W / S"));
        assert!(desktop.iter().any(|(input, _)| *input == "Esc"));

        let touch = control_hints(InputMode::Touch);
        assert_eq!(touch.len(), 3);
        assert!(touch.iter().all(|(input, _)| !input.contains("Esc")));
    }

    #[test]
    fn test_load_status_text() {
        assert_eq!(LoadStatus::Idle.describe(), "No model");
        assert_eq!(
            LoadStatus::Loading(LoadProgress { loaded: 1, total: 4 }).describe(),
            "Loading... 25%"
        );
        assert_eq!(
            LoadStatus::Loading(LoadProgress { loaded: 0, total: 0 }).describe(),
            "Loading..."
        );
        assert_eq!(
            LoadStatus::Failed("missing file".into()).describe(),
            "Failed: missing file"
        );
    }
}

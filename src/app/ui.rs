use super::state::{validate_justification, validate_label};
use super::FileImportApp;
use crate::events::{AnchorPosition, SessionEvent};
use crate::import::{ImportSession, IntakeMode, JustificationValue, LabelValue, Scope};
use crate::popover::PopoverView;
use crate::utils::file_size::{describe_file, describe_selection};
use eframe::egui::{self, Align, Color32, RichText};

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 50, 50);
const ACCENT_COLOR: Color32 = Color32::from_rgb(161, 89, 225);

fn anchor_of(response: &egui::Response) -> Option<AnchorPosition> {
    let center = response.rect.center();
    Some(AnchorPosition {
        x: center.x,
        y: center.y,
    })
}

fn pressed_outside(ctx: &egui::Context, window: Option<egui::Rect>) -> bool {
    // Combo box popups live outside the window rect.
    if ctx.memory(|m| m.any_popup_open()) {
        return false;
    }
    ctx.input(|i| match (i.pointer.interact_pos(), window) {
        (Some(pos), Some(rect)) => i.pointer.any_pressed() && !rect.contains(pos),
        _ => false,
    })
}

impl FileImportApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.heading("File Import");
                ui.add_space(5.0);
                ui.label(
                    RichText::new("Attach files or text to the repository with a label and a type")
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
            });
            ui.add_space(20.0);

            let idle = self.popover.is_none();
            ui.group(|ui| {
                ui.add_enabled_ui(idle, |ui| {
                    ui.horizontal(|ui| {
                        let files = ui.button("📁 Import Files");
                        if files.clicked() {
                            self.open_file_import(anchor_of(&files));
                        }
                        let create = ui.button("➕ Create Entity");
                        if create.clicked() {
                            self.open_import(ImportSession::new(), anchor_of(&create));
                        }
                        if !self.bridge.registry().is_empty() {
                            let cloud = ui.button("☁ Cloud Import");
                            if cloud.clicked() {
                                self.open_import(ImportSession::new(), anchor_of(&cloud));
                                self.dispatch(SessionEvent::ShowCloudSources);
                            }
                        }
                    });
                });
            });

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label("Paste text to import it as a single item");
                ui.add(
                    egui::TextEdit::multiline(&mut self.paste_text)
                        .desired_width(ui.available_width())
                        .desired_rows(4)
                        .font(egui::TextStyle::Monospace),
                );
                ui.horizontal(|ui| {
                    ui.label("Type");
                    ui.text_edit_singleline(&mut self.paste_mime_type);
                    let import = ui.add_enabled(idle, egui::Button::new("📝 Import Text"));
                    if import.clicked() {
                        self.open_text_import(anchor_of(&import));
                    }
                });
            });

            if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    ui.colored_label(ACCENT_COLOR, "Drop files to import them");
                });
            }

            ui.add_space(20.0);
            self.render_activity(ui);

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(15.0);
                if let Some(error) = &self.error_message {
                    ui.colored_label(ERROR_COLOR, error);
                }
            });
        });

        self.render_popover(ctx);
    }

    fn render_activity(&mut self, ui: &mut egui::Ui) {
        if self.activity.created_ids.is_empty() && self.activity.cloud_imports.is_empty() {
            return;
        }
        ui.group(|ui| {
            ui.label(self.activity.get_status_text());
            if self.activity.show_activity {
                ui.colored_label(ACCENT_COLOR, "Cloud import running, see activity for progress");
            }
            for id in &self.activity.selected_ids {
                ui.horizontal(|ui| {
                    ui.label("✅");
                    ui.monospace(id);
                });
            }
        });
    }

    fn render_popover(&mut self, ctx: &egui::Context) {
        let Some(popover) = self.popover.as_mut() else {
            return;
        };

        let mut events = Vec::new();
        let mut pick_files = false;
        let title = match popover.view() {
            PopoverView::Form => popover.session().title(),
            PopoverView::CloudSources | PopoverView::CloudSurface(_) => "Cloud Import".to_string(),
        };
        let mut window = egui::Window::new(title)
            .id(egui::Id::new("import_popover"))
            .collapsible(false)
            .resizable(false);
        if let Some(anchor) = popover.anchor() {
            window = window.default_pos(egui::pos2(anchor.x, anchor.y));
        }

        let shown = window.show(ctx, |ui| {
            if let Some(error) = popover.surface_error() {
                ui.colored_label(ERROR_COLOR, error);
            }
            let registry = self.bridge.registry();
            match popover.view_mut() {
                PopoverView::CloudSources => {
                    for source in registry.sources() {
                        if ui.selectable_label(false, &source.identifier).clicked() {
                            events.push(SessionEvent::CloudSourceSelected(source.identifier.clone()));
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        events.push(SessionEvent::Cancel);
                    }
                    return;
                }
                PopoverView::CloudSurface(active) => {
                    active.surface.show(ui);
                    if ui.button("Cancel").clicked() {
                        events.push(SessionEvent::Cancel);
                    }
                    return;
                }
                PopoverView::Form => {}
            }

            let can_select_files = popover.can_select_files();
            let session = popover.session();
            let lifecycle = popover.lifecycle();
            let editors = &mut self.editors;
            let classifications = &self.config.classifications;

            if can_select_files && ui.button("📁 Select Files").clicked() {
                pick_files = true;
            }

            match session.mode() {
                IntakeMode::Empty => {
                    if let Some(string_type) = session.string_type() {
                        ui.strong(string_type);
                    }
                }
                IntakeMode::Single => {
                    if let Some(summary) = describe_selection(session.files()) {
                        ui.label(summary);
                    }
                }
                IntakeMode::Multiple => {
                    if let Some(summary) = describe_selection(session.files()) {
                        ui.label(summary);
                    }
                    let mut collapsed = session.is_collapsed();
                    if ui
                        .checkbox(&mut collapsed, "Use the same label and type for all files")
                        .changed()
                    {
                        events.push(SessionEvent::CollapseToggled(collapsed));
                    }
                }
            }
            ui.separator();

            let validity = session.label_validity();
            let scopes: Vec<Scope> = validity.iter().map(|(scope, _)| *scope).collect();
            for (scope, valid) in validity {
                if let Scope::File(index) = scope {
                    ui.label(RichText::new(describe_file(&session.files()[index])).strong());
                }

                ui.horizontal(|ui| {
                    ui.label("Label");
                    let text = editors.label_mut(scope);
                    let mut edit = egui::TextEdit::singleline(text).hint_text("public");
                    if !valid {
                        edit = edit.text_color(ERROR_COLOR);
                    }
                    if ui.add(edit).changed() {
                        let text = editors.label_mut(scope).clone();
                        let valid = validate_label(&text);
                        events.push(SessionEvent::LabelChanged(scope, LabelValue::new(text, valid)));
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Type");
                    let current = editors.classification_mut(scope);
                    let before = current.clone();
                    let selected_text = current
                        .as_ref()
                        .and_then(|id| classifications.iter().find(|c| &c.id == id))
                        .map(|c| c.display_name.clone())
                        .unwrap_or_else(|| "Choose a type…".to_string());
                    egui::ComboBox::from_id_source(("classification", scope))
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            for option in classifications {
                                ui.selectable_value(
                                    current,
                                    Some(option.id.clone()),
                                    &option.display_name,
                                );
                            }
                        });
                    if *current != before {
                        events.push(SessionEvent::ClassificationChanged(scope, current.clone()));
                    }
                });
            }

            if session.requires_justification() && scopes.contains(&Scope::Collapsed) {
                ui.horizontal(|ui| {
                    ui.label("Justification");
                    if ui
                        .text_edit_singleline(&mut editors.justification)
                        .changed()
                    {
                        let text = editors.justification.clone();
                        let valid = validate_justification(&text);
                        events.push(SessionEvent::JustificationChanged(
                            Scope::Collapsed,
                            JustificationValue::new(text, valid),
                        ));
                    }
                });
            }

            if let Some(error) = lifecycle.field_error() {
                ui.colored_label(ERROR_COLOR, error);
            }
            if let Some(progress) = lifecycle.progress() {
                ui.add(
                    egui::ProgressBar::new(progress)
                        .show_percentage()
                        .fill(ACCENT_COLOR),
                );
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if lifecycle.is_submitting() && ui.button("Cancel").clicked() {
                    events.push(SessionEvent::Cancel);
                }
                if !lifecycle.is_submitting() && ui.button("Close").clicked() {
                    events.push(SessionEvent::Cancel);
                }
                if !registry.is_empty() && can_select_files && ui.button("☁ Cloud").clicked() {
                    events.push(SessionEvent::ShowCloudSources);
                }
                let submit = egui::Button::new(lifecycle.submit_label(session).to_string());
                if ui
                    .add_enabled(lifecycle.can_submit(session), submit)
                    .clicked()
                {
                    events.push(SessionEvent::Submit);
                }
            });
        });

        if pressed_outside(ctx, shown.map(|shown| shown.response.rect)) {
            events.push(SessionEvent::OutsideInteraction);
        }

        if pick_files {
            if let Some(files) = self.pick_files() {
                events.push(SessionEvent::FilesSelected(files));
            }
        }
        for event in events {
            self.dispatch(event);
        }
    }
}

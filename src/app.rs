use egui::{CentralPanel, Frame, Key, TopBottomPanel, ViewportCommand};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PlayerConfig;
use crate::player::Player;
use crate::transport::{PlayPause, Transport};
use crate::ui::{PlayerControls, VideoSurface};

/// The main window.
pub struct AgudieApp {
    config: PlayerConfig,
    player: Player,
    transport: Transport,
    error_message: Option<String>,
    shown_title: String,
}

impl AgudieApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PlayerConfig) -> Self {
        let player = Player::new(cc.egui_ctx.clone(), config.initial_volume);
        let transport = Transport::new(
            &config.title,
            config.initial_volume,
            config.poll_interval(),
        );
        let shown_title = transport.title().to_string();

        Self {
            config,
            player,
            transport,
            error_message: None,
            shown_title,
        }
    }

    fn pick_file(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Open Video File")
            .add_filter("Media Files", self.config.media_extensions.as_slice())
            .add_filter("All Files", &["*"]);
        if let Some(ref dir) = self.config.start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    fn open_dialog(&mut self) {
        if let Some(path) = self.pick_file() {
            self.open(path);
        }
    }

    fn open(&mut self, path: PathBuf) {
        match self.transport.open(&mut self.player, &path, Instant::now()) {
            Ok(()) => self.error_message = None,
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, now: Instant) -> bool {
        let mut wants_file = false;

        let nothing_focused = ctx.memory(|mem| mem.focused().is_none());
        if nothing_focused && ctx.input(|i| i.key_pressed(Key::Space)) {
            wants_file |= self.transport.play_pause(&mut self.player, now)
                == PlayPause::NeedsMedia;
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open(path);
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            log::info!("Window closing");
            self.transport.close(&mut self.player);
        }

        wants_file
    }
}

impl eframe::App for AgudieApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.player.update();
        self.transport.tick(&mut self.player, now);

        let mut wants_file = self.handle_input(ctx, now);

        TopBottomPanel::bottom("controls").show(ctx, |ui| {
            wants_file |= PlayerControls::show(ui, &mut self.transport, &mut self.player, now);
        });

        CentralPanel::default().frame(Frame::none()).show(ctx, |ui| {
            let frame = self
                .player
                .texture()
                .map(|t| t.id())
                .zip(self.player.video_size());
            VideoSurface::show(ui, frame, self.error_message.as_deref());
        });

        if wants_file {
            self.open_dialog();
        }

        if self.shown_title != self.transport.title() {
            self.shown_title = self.transport.title().to_string();
            ctx.send_viewport_cmd(ViewportCommand::Title(self.shown_title.clone()));
        }

        if let Some(wait) = self.transport.timer().time_until_next(now) {
            ctx.request_repaint_after(wait);
        }
    }
}

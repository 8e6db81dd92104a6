use crate::{
    deletion::DeletionWorkflow,
    error::Error,
    interaction::UserInteraction,
    media::{Camera, Classification},
    session::Session,
};
use log::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    Enter,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Delete,
    Backspace,
    Char(char),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub code: KeyCode,
    pub meta: bool,
}

impl KeyInput {
    pub fn new(code: KeyCode) -> Self {
        Self { code, meta: false }
    }

    pub fn with_meta(code: KeyCode) -> Self {
        Self { code, meta: true }
    }

    /// Parses names like `space`, `up`, `meta+backspace` or a single
    /// character.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (meta, name) = match text.split_once('+') {
            Some((modifier, name))
                if modifier.eq_ignore_ascii_case("meta") || modifier.eq_ignore_ascii_case("cmd") =>
            {
                (true, name)
            }
            _ => (false, text),
        };
        let code = match name.to_ascii_lowercase().as_str() {
            "space" | " " => KeyCode::Space,
            "enter" | "return" => KeyCode::Enter,
            "up" => KeyCode::ArrowUp,
            "down" => KeyCode::ArrowDown,
            "left" => KeyCode::ArrowLeft,
            "right" => KeyCode::ArrowRight,
            "delete" | "del" => KeyCode::Delete,
            "backspace" => KeyCode::Backspace,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                    _ => return None,
                }
            }
        };
        Some(Self { code, meta })
    }

    /// Keys whose platform default (scrolling, history navigation) must not
    /// run, whether or not an entry is loaded.
    pub fn suppresses_default(&self) -> bool {
        matches!(
            self.code,
            KeyCode::Space
                | KeyCode::ArrowUp
                | KeyCode::ArrowDown
                | KeyCode::ArrowLeft
                | KeyCode::ArrowRight
                | KeyCode::Delete
                | KeyCode::Backspace
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    PlayPauseOrSelect,
    Previous,
    Next,
    SelectCamera(Camera),
    SeekBack,
    SeekForward,
    DeleteMediaSet,
    DeleteFolder,
    ToggleLayout,
    RateUp,
    RateDown,
    Filter(Classification),
}

impl Command {
    pub fn from_key(input: KeyInput) -> Option<Self> {
        let command = match (input.code, input.meta) {
            (KeyCode::Backspace, true) => Command::DeleteFolder,
            (KeyCode::Delete | KeyCode::Backspace, false) => Command::DeleteMediaSet,
            (_, true) => return None,
            (KeyCode::Space | KeyCode::Enter, _) => Command::PlayPauseOrSelect,
            (KeyCode::ArrowUp, _) => Command::Previous,
            (KeyCode::ArrowDown, _) => Command::Next,
            (KeyCode::ArrowLeft, _) => Command::SeekBack,
            (KeyCode::ArrowRight, _) => Command::SeekForward,
            (KeyCode::Char('w'), _) => Command::SelectCamera(Camera::Front),
            (KeyCode::Char('s'), _) => Command::SelectCamera(Camera::Back),
            (KeyCode::Char('a'), _) => Command::SelectCamera(Camera::Left),
            (KeyCode::Char('d'), _) => Command::SelectCamera(Camera::Right),
            (KeyCode::Char('g'), _) => Command::ToggleLayout,
            (KeyCode::Char('['), _) => Command::RateDown,
            (KeyCode::Char(']'), _) => Command::RateUp,
            (KeyCode::Char(digit @ '1'..='4'), _) => {
                let index = digit as usize - '1' as usize;
                Command::Filter(Classification::FILTERS[index])
            }
            _ => return None,
        };
        Some(command)
    }
}

pub struct KeyBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

pub const KEY_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        keys: "space / enter",
        description: "play or pause, or open the highlighted entry",
    },
    KeyBinding {
        keys: "up / down",
        description: "previous / next entry",
    },
    KeyBinding {
        keys: "w / s / a / d",
        description: "front / back / left / right camera",
    },
    KeyBinding {
        keys: "left / right",
        description: "seek back / forward",
    },
    KeyBinding {
        keys: "g",
        description: "toggle single / grid layout",
    },
    KeyBinding {
        keys: "[ / ]",
        description: "slower / faster",
    },
    KeyBinding {
        keys: "1 - 4",
        description: "show all / event / sentry / dashcam",
    },
    KeyBinding {
        keys: "delete / backspace",
        description: "delete the current videos",
    },
    KeyBinding {
        keys: "meta+backspace",
        description: "delete the current folder",
    },
];

pub struct CommandDispatcher {
    seek_step: f64,
    deletion: DeletionWorkflow,
}

impl CommandDispatcher {
    pub fn new(seek_step: f64, deletion: DeletionWorkflow) -> Self {
        Self {
            seek_step,
            deletion,
        }
    }

    /// Maps and runs one key press. Returns the command it ran, if any.
    pub async fn handle_key(
        &self,
        session: &mut Session,
        input: KeyInput,
        ui: &dyn UserInteraction,
    ) -> Result<Option<Command>, Error> {
        let Some(command) = Command::from_key(input) else {
            return Ok(None);
        };
        self.dispatch(session, command, ui).await?;
        Ok(Some(command))
    }

    pub async fn dispatch(
        &self,
        session: &mut Session,
        command: Command,
        ui: &dyn UserInteraction,
    ) -> Result<(), Error> {
        debug!("dispatching {command:?}");
        match command {
            Command::PlayPauseOrSelect => {
                if session.engine.loaded_time().is_some() {
                    session.engine.toggle_play_pause();
                } else {
                    let index = session.catalog.selected_index();
                    session.select_visible(index).await?;
                }
            }
            Command::Previous => self.navigate(session, -1).await?,
            Command::Next => self.navigate(session, 1).await?,
            Command::SelectCamera(camera) => session.engine.select_camera(camera),
            Command::SeekBack => session.engine.seek_relative(-self.seek_step),
            Command::SeekForward => session.engine.seek_relative(self.seek_step),
            Command::ToggleLayout => session.engine.toggle_layout(),
            Command::RateUp => {
                let rate = session.engine.rate().faster();
                session.engine.set_rate(rate);
            }
            Command::RateDown => {
                let rate = session.engine.rate().slower();
                session.engine.set_rate(rate);
            }
            Command::Filter(filter) => {
                session.set_filter(filter).await?;
            }
            Command::DeleteMediaSet => {
                self.deletion.delete_current(session, ui).await?;
            }
            Command::DeleteFolder => {
                if let Some(time) = session.catalog.current_time() {
                    self.deletion.delete_folder(session, time, ui).await?;
                }
            }
        }
        Ok(())
    }

    /// Moves through the visible list without wrapping around.
    async fn navigate(&self, session: &mut Session, step: isize) -> Result<(), Error> {
        let len = session.catalog.visible_len();
        if len == 0 {
            return Ok(());
        }
        let index = session.catalog.selected_index();
        let target = index.saturating_add_signed(step).min(len - 1);
        let Some(time) = session.catalog.visible_at(target).map(|entry| entry.time) else {
            return Ok(());
        };
        if target == index && session.catalog.current_time() == Some(time) {
            return Ok(());
        }
        session.select(time).await?;
        Ok(())
    }
}

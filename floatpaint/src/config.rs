use floatpaint_core::{color::Color, geom::Size, selection::SelectionOptions};

const DOCUMENTATION: &str = r#"# Floatpaint settings. You may edit this file, but be aware that formatting and comments will not
# be preserved.

# canvas_width, canvas_height: size in pixels of new documents.
# canvas_color: [r, g, b, a] fill of new documents.
# log_level: one of "off", "error", "warn", "info", "debug", "trace".
# [selection]: how floating selections are stamped.
#   mask: skip pixels equal to the background color.
#   background: [r, g, b, a] used to erase the area a selection was lifted from.
#   alpha_blend: blend translucent pixels instead of replacing.

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(
    serde::Serialize,
    serde::Deserialize,
    strum::IntoStaticStr,
    strum::EnumIter,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}
impl From<LogLevel> for log::LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionConfig {
    pub mask: bool,
    pub background: [u8; 4],
    pub alpha_blend: bool,
}
impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionOptions::default().into()
    }
}
impl From<SelectionOptions> for SelectionConfig {
    fn from(value: SelectionOptions) -> Self {
        Self {
            mask: value.mask_enabled,
            background: value.background.into(),
            alpha_blend: value.alpha_blend,
        }
    }
}
impl From<SelectionConfig> for SelectionOptions {
    fn from(value: SelectionConfig) -> Self {
        Self {
            mask_enabled: value.mask,
            background: value.background.into(),
            alpha_blend: value.alpha_blend,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub canvas_color: [u8; 4],
    pub log_level: LogLevel,
    pub selection: SelectionConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 640,
            canvas_height: 480,
            canvas_color: Color::WHITE.into(),
            log_level: LogLevel::default(),
            selection: SelectionConfig::default(),
        }
    }
}
impl Config {
    pub const FILENAME: &'static str = "floatpaint.toml";
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }
    #[must_use]
    pub fn canvas_color(&self) -> Color {
        self.canvas_color.into()
    }
    /// Where settings are kept if no path is given.
    #[must_use]
    pub fn default_path() -> Option<std::path::PathBuf> {
        let mut dir = preferences_dir()?;
        dir.push(Self::FILENAME);
        Some(dir)
    }
    pub fn parse(string: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(string)?)
    }
    /// Load from `path`, or the preferences dir. Falls back on defaults, reporting why.
    ///
    /// The logger isn't running yet when this is called, so the failure is handed back instead of logged.
    #[must_use]
    pub fn load_or_default(path: Option<&std::path::Path>) -> (Self, Option<anyhow::Error>) {
        let path = path.map(std::path::Path::to_path_buf).or_else(Self::default_path);
        let Some(path) = path else {
            return (Self::default(), Some(anyhow::anyhow!("No preferences dir found")));
        };
        let config: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(&path)?;
            let config = Self::parse(&string)?;
            Ok(config)
        };
        match config {
            Ok(config) => (config, None),
            Err(err) => (
                Self::default(),
                Some(err.context(format!("Failed to load {}", path.display()))),
            ),
        }
    }
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let string = toml::ser::to_string_pretty(self)?;
        // Prefix some documentation.
        Ok(DOCUMENTATION.to_owned() + &string)
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        std::fs::write(preferences, self.to_toml()?)?;
        Ok(())
    }
}

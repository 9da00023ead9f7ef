use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::Deserialize;
use shakmaty::Color;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureCfg {
    /// Normalized thumb-index distance below which a pinch registers.
    pub pinch_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardCfg {
    pub square_size: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacingCfg {
    pub target_hz: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorCfg {
    /// Interpreter that runs the landmark helper, e.g. ".venv/bin/python".
    pub command: String,
    pub script: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ai_plays")]
    pub plays: String,
}

fn default_ai_plays() -> String {
    "black".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub meta: Meta,
    pub gesture: GestureCfg,
    pub board: BoardCfg,
    pub pacing: PacingCfg,
    pub detector: DetectorCfg,
    pub ai: AiCfg,
}

impl Profile {
    pub fn board_size(&self) -> f32 {
        self.board.square_size * crate::board::BOARD_DIM as f32
    }

    pub fn ai_color(&self) -> Color {
        if self.ai.plays == "white" {
            Color::White
        } else {
            Color::Black
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> PathBuf {
    let home = UserDirs::new().unwrap().home_dir().to_path_buf();
    home.join(".config").join("pinchess")
}

fn profiles_dir() -> PathBuf {
    config_dir().join("profiles")
}

fn active_ptr_path() -> PathBuf {
    config_dir().join("active")
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        let cfgdir = config_dir();
        let profdir = profiles_dir();
        fs::create_dir_all(&profdir)?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = active_ptr_path();
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = Self::load_profile(&active_name)?;

        Ok(Self {
            active_name,
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    pub fn reload(&mut self) -> Result<()> {
        self.profile = Self::load_profile(&self.active_name)?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profiles_dir.join(format!("{name}.toml"));
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.reload()?;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                if let Some(ext) = e.path().extension() {
                    if ext == "toml" {
                        if let Some(stem) = e.path().file_stem().and_then(|s| s.to_str()) {
                            v.push(stem.to_string());
                        }
                    }
                }
            }
        }
        v.sort();
        v
    }

    fn load_profile(name: &str) -> Result<Profile> {
        let path = profiles_dir().join(format!("{name}.toml"));
        let txt = fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        parse_profile(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        let det = &self.profile.detector;
        serde_json::json!({
            "profiles_dir": self.profiles_dir,
            "active_profile": self.active_name,
            "detector_command": det.command,
            "detector_script_present": Path::new(&det.script).exists(),
            "session_socket_present": crate::ipc::runtime::socket_path().exists(),
            "ai_enabled": self.profile.ai.enabled,
            "hints": {
                "detector_deps": "pip install mediapipe opencv-python",
                "camera_access": "user must be able to open /dev/video0"
            }
        })
    }
}

pub fn parse_profile(txt: &str) -> Result<Profile> {
    let profile: Profile = toml::from_str(txt)?;
    validate_profile(&profile)?;
    Ok(profile)
}

fn validate_profile(p: &Profile) -> Result<()> {
    if !(0.0..1.0).contains(&p.gesture.pinch_threshold) || p.gesture.pinch_threshold == 0.0 {
        return Err(anyhow!(
            "gesture.pinch_threshold must be in (0,1) normalized units"
        ));
    }
    if p.board.square_size <= 0.0 {
        return Err(anyhow!("board.square_size must be positive"));
    }
    if !(1..=240).contains(&p.pacing.target_hz) {
        return Err(anyhow!("pacing.target_hz must be in 1..=240"));
    }
    if p.detector.command.trim().is_empty() || p.detector.script.trim().is_empty() {
        return Err(anyhow!("detector.command and detector.script are required"));
    }
    if p.ai.plays != "white" && p.ai.plays != "black" {
        return Err(anyhow!("ai.plays must be 'white' or 'black'"));
    }
    Ok(())
}

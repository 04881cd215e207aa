//! Track duration resolution
//!
//! Sources are tried in a fixed order, cheapest and most authoritative
//! first; a source is skipped only when it is missing, unreadable or has no
//! data:
//! 1. the original audio, searched in several candidate locations
//! 2. any separated stem in the stems directory
//! 3. transcoded audio left by an earlier conversion run
//! 4. the last beat, stretched by a trailing margin for the outro
//! 5. a fixed default

use crate::audio::probe_duration;
use crate::export::{ConvertConfig, OutputOrganizer};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Everything the resolver may look at for one track
#[derive(Debug, Clone, Copy)]
pub struct DurationSources<'a> {
    /// Audio path as recorded by the analyzer (`file_path`/`file_name`)
    pub audio_ref: Option<&'a Path>,

    /// The analysis JSON being converted
    pub metadata_path: &'a Path,

    /// Directory holding separated stems
    pub stems_dir: &'a Path,

    /// Output name of the track (used for earlier-run artifacts)
    pub track_name: &'a str,

    /// Beat times, possibly empty
    pub beats: &'a [f64],
}

/// Where a resolved duration came from
#[derive(Debug, Clone, PartialEq)]
pub enum DurationSource {
    Audio(PathBuf),
    Stem(PathBuf),
    PreviousRun(PathBuf),
    LastBeat,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDuration {
    pub seconds: f64,
    pub source: DurationSource,
}

type Provider = fn(&DurationResolver, &DurationSources) -> Option<ResolvedDuration>;

/// Multi-source duration lookup
#[derive(Debug, Clone)]
pub struct DurationResolver {
    organizer: OutputOrganizer,
    sample_data_dirs: Vec<PathBuf>,
    working_dir: Option<PathBuf>,
    trailing_margin: f64,
    default_duration: f64,
}

impl DurationResolver {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            organizer: OutputOrganizer::new(config.output_dir.clone()),
            sample_data_dirs: config.sample_data_dirs.clone(),
            working_dir: std::env::current_dir().ok(),
            trailing_margin: config.trailing_margin,
            default_duration: config.default_duration,
        }
    }

    /// Search relative locations from `dir` instead of the process cwd
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Duration from the first source that yields one, or the default
    pub fn resolve(&self, sources: &DurationSources) -> ResolvedDuration {
        self.resolve_measured(sources).unwrap_or_else(|| {
            log::warn!(
                "No duration source for {}, using default {:.1}s",
                sources.track_name,
                self.default_duration
            );
            ResolvedDuration {
                seconds: self.default_duration,
                source: DurationSource::Default,
            }
        })
    }

    /// Duration from audio or beats only, without the fixed default
    pub fn resolve_measured(&self, sources: &DurationSources) -> Option<ResolvedDuration> {
        const PROVIDERS: [(&str, Provider); 4] = [
            ("audio", DurationResolver::from_audio),
            ("stems", DurationResolver::from_stems),
            ("previous run", DurationResolver::from_previous_run),
            ("last beat", DurationResolver::from_last_beat),
        ];

        PROVIDERS.iter().find_map(|(name, provider)| {
            let resolved = provider(self, sources);
            match &resolved {
                Some(r) => log::info!(
                    "Duration {:.2}s for {} from {}",
                    r.seconds,
                    sources.track_name,
                    name
                ),
                None => log::debug!("No duration from {} for {}", name, sources.track_name),
            }
            resolved
        })
    }

    /// Locations where the original audio may live, in probe order
    pub fn candidate_audio_paths(&self, sources: &DurationSources) -> Vec<PathBuf> {
        let Some(audio_ref) = sources.audio_ref else {
            return Vec::new();
        };

        let mut candidates = vec![audio_ref.to_path_buf()];

        if let Some(name) = audio_ref.file_name() {
            let metadata_dir = sources.metadata_path.parent();

            if let Some(dir) = metadata_dir {
                candidates.push(dir.join(name));
            }
            if let Some(cwd) = &self.working_dir {
                candidates.push(cwd.join(name));
            }
            for sample_dir in &self.sample_data_dirs {
                if let Some(cwd) = &self.working_dir {
                    candidates.push(cwd.join(sample_dir).join(name));
                }
                if let Some(grandparent) = metadata_dir.and_then(Path::parent) {
                    candidates.push(grandparent.join(sample_dir).join(name));
                }
            }
        }

        let mut unique = Vec::with_capacity(candidates.len());
        for path in candidates {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        unique
    }

    fn from_audio(&self, sources: &DurationSources) -> Option<ResolvedDuration> {
        self.candidate_audio_paths(sources)
            .into_iter()
            .find_map(|path| {
                probe_seconds(&path).map(|seconds| ResolvedDuration {
                    seconds,
                    source: DurationSource::Audio(path),
                })
            })
    }

    fn from_stems(&self, sources: &DurationSources) -> Option<ResolvedDuration> {
        if !sources.stems_dir.is_dir() {
            return None;
        }

        let stems: Vec<PathBuf> = WalkDir::new(sources.stems_dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
            })
            .collect();

        stems.into_iter().find_map(|path| {
            probe_seconds(&path).map(|seconds| ResolvedDuration {
                seconds,
                source: DurationSource::Stem(path),
            })
        })
    }

    fn from_previous_run(&self, sources: &DurationSources) -> Option<ResolvedDuration> {
        let artifacts = [
            self.organizer.mixdown_path(sources.track_name),
            self.organizer.demixed_stem_path(sources.track_name, "bass"),
        ];

        artifacts.into_iter().find_map(|path| {
            probe_seconds(&path).map(|seconds| ResolvedDuration {
                seconds,
                source: DurationSource::PreviousRun(path),
            })
        })
    }

    fn from_last_beat(&self, sources: &DurationSources) -> Option<ResolvedDuration> {
        let last_beat = sources.beats.last().copied()?;
        let seconds = last_beat * self.trailing_margin;
        if !(seconds.is_finite() && seconds > 0.0) {
            return None;
        }

        log::warn!(
            "Audio not found for {}, estimating duration from last beat {:.2}s",
            sources.track_name,
            last_beat
        );
        Some(ResolvedDuration {
            seconds,
            source: DurationSource::LastBeat,
        })
    }
}

/// Positive duration of an existing, decodable file
fn probe_seconds(path: &Path) -> Option<f64> {
    if !path.is_file() {
        return None;
    }

    match probe_duration(path) {
        Ok(duration) => {
            let seconds = duration.as_secs_f64();
            if seconds > 0.0 {
                log::debug!("Audio found at {:?}: {:.2}s", path, seconds);
                Some(seconds)
            } else {
                log::warn!("Audio at {:?} has no playable length", path);
                None
            }
        }
        Err(e) => {
            log::warn!("Could not read duration of {:?}: {}", path, e);
            None
        }
    }
}

use crate::models::ParsedEpisode;
use camino::Utf8Path;
use regex::Regex;

/// Extensions treated as video files (lower-case, without the dot)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "mpg", "mpeg", "m4v"];

/// Extensions kept next to videos during cleanup
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "idx", "ssa", "ass", "vtt"];

/// Release-group and encoding tags stripped from titles (matched whole-word, case-insensitive)
pub const NOISE_TERMS: &[&str] = &[
    "720p", "1080p", "2160p", "480p", "BRRip", "BluRay", "WEBRip", "WEB-DL", "HDRip", "DVDRip",
    "DVDSCR", "CAM", "XviD", "x264", "h264", "H.264", "H264", "AAC", "MP3", "RARBG", "YIFY", "YTS",
    "ETRG", "Ganool", "10bit", "6CH", "HEVC", "HQ", "HD", "TS", "PROPER", "NEW", "PSA", "CPG",
    "GalaxyRG", "999MB", "Rip", "DvD", "DvDRip", "x265", "DivX", "AMZN", "WEB", "WEB-DLRip", "NF",
    "Remastered", "Atmos", "HC", "HDCAM", "Line", "Subs", "EXTENDED", "UNRATED", "Director's Cut",
    "IMAX", "Repack", "READNFO", "FIX", "V2", "V3", "FINAL", "LIMITED",
];

/// Title used when neither the filename, the folders nor MediaInfo name a series
pub const UNKNOWN_SERIES: &str = "Unknown Series";

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove characters that are illegal in file names and trim dots and spaces from both ends.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    cleaned.trim_matches(|c| c == '.' || c == ' ').to_string()
}

/// Upper-case the first character of every word and lower-case the rest.
///
/// Words are split on whitespace and re-joined with single spaces.
pub fn capitalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    Utf8Path::new(name)
        .extension()
        .map(|ext| extensions.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

pub fn is_video_file(name: &str) -> bool {
    has_extension(name, VIDEO_EXTENSIONS)
}

pub fn is_subtitle_file(name: &str) -> bool {
    has_extension(name, SUBTITLE_EXTENSIONS)
}

/// Whether a file is hidden: dot-prefixed on Unix, hidden attribute on Windows.
#[cfg(not(windows))]
pub fn is_hidden(path: &Utf8Path) -> bool {
    path.file_name().is_some_and(|name| name.starts_with('.'))
}

#[cfg(windows)]
pub fn is_hidden(path: &Utf8Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    std::fs::metadata(path)
        .map(|meta| meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

/// Parser for scene/release style file and folder names
///
/// All patterns are compiled once at construction:
///
/// - `bracket_pattern`: `[..]`, `(..)` and `{..}` groups, e.g. `[YTS.MX]`
/// - `noise_pattern`: whole-word alternation of [`NOISE_TERMS`]
/// - `year_pattern`: stand-alone `19xx` / `20xx`
/// - `separator_pattern`: runs of `.`, `-`, `_` and whitespace
/// - `tv_patterns`: the four `<title> <season/episode>` layouts, tried in order
/// - `leading_episode_pattern`: names that start with `SxxEyy`
pub struct ReleaseNameParser {
    bracket_pattern: Regex,
    noise_pattern: Regex,
    year_pattern: Regex,
    separator_pattern: Regex,
    tv_patterns: Vec<Regex>,
    leading_episode_pattern: Regex,
    season_folder_pattern: Regex,
    season_number_pattern: Regex,
    season_episode_pattern: Regex,
    bare_episode_pattern: Regex,
    year_suffix_pattern: Regex,
}

impl ReleaseNameParser {
    pub fn new() -> Self {
        let noise = NOISE_TERMS
            .iter()
            .map(|term| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            bracket_pattern: Regex::new(r"[\[\(\{].*?[\]\)\}]").expect("Invalid bracket regex"),
            noise_pattern: Regex::new(&format!(r"(?i)\b(?:{})\b", noise)).expect("Invalid noise regex"),
            year_pattern: Regex::new(r"\b(?:19|20)\d{2}\b").expect("Invalid year regex"),
            separator_pattern: Regex::new(r"[.\-_\s]+").expect("Invalid separator regex"),
            tv_patterns: [
                r"(?i)^(.*?)[\s.]+s(\d+)[\s.]*e(\d+)",
                r"(?i)^(.*?)[\s.]+(\d+)x(\d+)",
                r"(?i)^(.*?)[\s.]+season[\s.]*(\d+)[\s.]+episode[\s.]*(\d+)",
                r"(?i)^(.*?)\s*[.-]?\s*(\d{1,2})(\d{2})",
            ]
            .iter()
            .map(|pattern| Regex::new(pattern).expect("Invalid TV regex"))
            .collect(),
            leading_episode_pattern: Regex::new(r"(?i)^s(\d+)e(\d+)\s*(.*?)$")
                .expect("Invalid leading episode regex"),
            season_folder_pattern: Regex::new(r"[sS]eason\s*\d+").expect("Invalid season folder regex"),
            season_number_pattern: Regex::new(r"(?i)season\s*(\d+)").expect("Invalid season number regex"),
            season_episode_pattern: Regex::new(r"(?i)s\d+\s*e(\d+)").expect("Invalid episode regex"),
            bare_episode_pattern: Regex::new(r"(?i)e(\d+)").expect("Invalid bare episode regex"),
            year_suffix_pattern: Regex::new(r"\s\(\d{4}\)$").expect("Invalid year suffix regex"),
        }
    }

    /// Underscores count as word breaks, so `Arrival_2016_1080p` loses its year and tags.
    fn strip_release_noise(&self, stem: &str) -> String {
        let spaced = stem.replace('_', " ");
        let without_brackets = self.bracket_pattern.replace_all(&spaced, "");
        self.noise_pattern
            .replace_all(&without_brackets, "")
            .into_owned()
    }

    /// Replace every run of `.`, `-`, `_` and whitespace with one space, then trim.
    pub fn collapse_separators(&self, text: &str) -> String {
        self.separator_pattern
            .replace_all(text, " ")
            .trim()
            .to_string()
    }

    /// Clean movie title from a release-style file stem.
    ///
    /// `The.Matrix.1999.1080p.BluRay.x264-[YTS]` becomes `The Matrix`.
    pub fn parse_movie_title(&self, stem: &str) -> String {
        let cleaned = self.strip_release_noise(stem);
        let without_years = self.year_pattern.replace_all(&cleaned, "");
        self.collapse_separators(&without_years)
    }

    /// First stand-alone `19xx`/`20xx` year in the stem.
    pub fn extract_year(&self, stem: &str) -> Option<String> {
        let spaced = stem.replace('_', " ");
        self.year_pattern
            .find(&spaced)
            .map(|found| found.as_str().to_string())
    }

    /// Split a TV release stem into series title, season and episode.
    ///
    /// Returns a default (empty) [`ParsedEpisode`] when no layout matches.
    pub fn parse_tv_show_filename(&self, stem: &str) -> ParsedEpisode {
        let cleaned = self.collapse_separators(&self.strip_release_noise(stem));

        for pattern in &self.tv_patterns {
            if let Some(caps) = pattern.captures(&cleaned) {
                return ParsedEpisode {
                    series_title: caps[1].trim().to_string(),
                    season: Some(caps[2].to_string()),
                    episode: Some(caps[3].to_string()),
                };
            }
        }

        if let Some(caps) = self.leading_episode_pattern.captures(&cleaned) {
            return ParsedEpisode {
                series_title: String::new(),
                season: Some(caps[1].to_string()),
                episode: Some(caps[2].to_string()),
            };
        }

        ParsedEpisode::default()
    }

    pub fn is_season_folder(&self, name: &str) -> bool {
        self.season_folder_pattern.is_match(name)
    }

    /// Series title from a folder like `Breaking Bad Season 2`.
    pub fn extract_series_title_from_season_folder(&self, name: &str) -> String {
        let title = self.season_folder_pattern.replace_all(name, "");
        let title = title.trim();
        if title.is_empty() {
            UNKNOWN_SERIES.to_string()
        } else {
            title.to_string()
        }
    }

    /// Season number from a folder name like `Season 03`.
    pub fn season_from_folder(&self, name: &str) -> Option<String> {
        self.season_number_pattern
            .captures(name)
            .map(|caps| caps[1].to_string())
    }

    /// Episode number from a stem, preferring the `SxxEyy` form over a bare `Eyy`.
    pub fn episode_from_stem(&self, stem: &str) -> Option<String> {
        self.season_episode_pattern
            .captures(stem)
            .or_else(|| self.bare_episode_pattern.captures(stem))
            .map(|caps| caps[1].to_string())
    }

    /// `Show Name (2008)` -> `Show Name`
    pub fn strip_year_suffix(&self, folder_name: &str) -> String {
        self.year_suffix_pattern
            .replace(folder_name, "")
            .into_owned()
    }
}

impl Default for ReleaseNameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(title: &str, season: &str, episode: &str) -> ParsedEpisode {
        ParsedEpisode {
            series_title: title.to_string(),
            season: Some(season.to_string()),
            episode: Some(episode.to_string()),
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("What If...?"), "What If");
        assert_eq!(sanitize_filename("Mission: Impossible"), "Mission Impossible");
        assert_eq!(sanitize_filename(" .hidden. "), "hidden");
        assert_eq!(sanitize_filename("a<b>c|d*e\"f/g\\h"), "abcdefgh");
    }

    #[test]
    fn test_capitalize_title() {
        assert_eq!(capitalize_title("the  MATRIX reloaded"), "The Matrix Reloaded");
        assert_eq!(capitalize_title("o'brien"), "O'brien");
        assert_eq!(capitalize_title(""), "");
    }

    #[test]
    fn test_extension_checks() {
        assert!(is_video_file("movie.MKV"));
        assert!(is_video_file("clip.m4v"));
        assert!(!is_video_file("notes.txt"));
        assert!(!is_video_file("mkv"));
        assert!(is_subtitle_file("movie.en.SRT"));
        assert!(!is_subtitle_file("movie.nfo"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_is_hidden_dotfile() {
        assert!(is_hidden(Utf8Path::new("/library/.DS_Store")));
        assert!(!is_hidden(Utf8Path::new("/library/movie.mkv")));
    }

    #[test]
    fn test_parse_movie_title() {
        let parser = ReleaseNameParser::new();

        assert_eq!(
            parser.parse_movie_title("The.Matrix.1999.1080p.BluRay.x264-[YTS.MX]"),
            "The Matrix"
        );
        assert_eq!(
            parser.parse_movie_title("Inception.(2010).720p.BRRip.x264.AAC-ETRG"),
            "Inception"
        );
        assert_eq!(parser.parse_movie_title("Arrival_720p"), "Arrival");
        assert_eq!(
            parser.parse_movie_title("Arrival_2016_1080p_BluRay"),
            "Arrival"
        );
        assert_eq!(
            parser.extract_year("Arrival_2016_1080p_BluRay"),
            Some("2016".to_string())
        );
        assert_eq!(
            parser.parse_movie_title("Heat {Director's Cut} EXTENDED.720p"),
            "Heat"
        );
    }

    #[test]
    fn test_extract_year() {
        let parser = ReleaseNameParser::new();

        assert_eq!(parser.extract_year("The.Matrix.1999.1080p"), Some("1999".to_string()));
        assert_eq!(parser.extract_year("Arrival_2016_720p"), Some("2016".to_string()));
        assert_eq!(parser.extract_year("Heat (1995)"), Some("1995".to_string()));
        assert_eq!(parser.extract_year("Movie.1080p"), None);
    }

    #[test]
    fn test_parse_tv_show_filename_sxxeyy() {
        let parser = ReleaseNameParser::new();

        assert_eq!(
            parser.parse_tv_show_filename("Breaking.Bad.S02E05.720p.WEB-DL"),
            episode("Breaking Bad", "02", "05")
        );
        assert_eq!(
            parser.parse_tv_show_filename("the_office_s3.e10"),
            episode("the office", "3", "10")
        );
    }

    #[test]
    fn test_parse_tv_show_filename_other_layouts() {
        let parser = ReleaseNameParser::new();

        assert_eq!(
            parser.parse_tv_show_filename("Firefly 1x07"),
            episode("Firefly", "1", "07")
        );
        assert_eq!(
            parser.parse_tv_show_filename("Lost Season 4 Episode 12"),
            episode("Lost", "4", "12")
        );
        assert_eq!(
            parser.parse_tv_show_filename("Fringe - 305"),
            episode("Fringe", "3", "05")
        );
    }

    #[test]
    fn test_parse_tv_show_filename_leading_episode() {
        let parser = ReleaseNameParser::new();

        assert_eq!(
            parser.parse_tv_show_filename("S01E02 Pilot Part Two"),
            episode("", "01", "02")
        );
    }

    #[test]
    fn test_parse_tv_show_filename_no_match() {
        let parser = ReleaseNameParser::new();

        let parsed = parser.parse_tv_show_filename("Holiday Special");
        assert_eq!(parsed, ParsedEpisode::default());
        assert!(!parsed.has_title());
    }

    #[test]
    fn test_season_folders() {
        let parser = ReleaseNameParser::new();

        assert!(parser.is_season_folder("Season 1"));
        assert!(parser.is_season_folder("Lost season 02"));
        assert!(!parser.is_season_folder("Specials"));

        assert_eq!(
            parser.extract_series_title_from_season_folder("Breaking Bad Season 2"),
            "Breaking Bad"
        );
        assert_eq!(
            parser.extract_series_title_from_season_folder("Season 3"),
            UNKNOWN_SERIES
        );

        assert_eq!(parser.season_from_folder("Season 03"), Some("03".to_string()));
        assert_eq!(parser.season_from_folder("SEASON7"), Some("7".to_string()));
        assert_eq!(parser.season_from_folder("Extras"), None);
    }

    #[test]
    fn test_episode_from_stem() {
        let parser = ReleaseNameParser::new();

        assert_eq!(parser.episode_from_stem("Show S01E09"), Some("09".to_string()));
        assert_eq!(parser.episode_from_stem("Show s1 e4"), Some("4".to_string()));
        assert_eq!(parser.episode_from_stem("Episode E12"), Some("12".to_string()));
        assert_eq!(parser.episode_from_stem("Finale"), None);
    }

    #[test]
    fn test_strip_year_suffix() {
        let parser = ReleaseNameParser::new();

        assert_eq!(parser.strip_year_suffix("Doctor Who (2005)"), "Doctor Who");
        assert_eq!(parser.strip_year_suffix("The Office (US)"), "The Office (US)");
        assert_eq!(parser.strip_year_suffix("Dark"), "Dark");
    }
}

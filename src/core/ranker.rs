//! Picks the best candidate when deterministic rules are not enough.
//!
//! A `Ranker` always answers with an index into its input. When no backend is
//! configured, the backend fails, or its answer is not a number in
//! `1..=len`, the index is `0` and the reason is kept in `Ranked::degraded`.

use super::error::CoreError;
use super::query::ProjectCode;
use super::{FileDisambiguationProfile, FileReference};
use async_trait::async_trait;

/// Fixed wording and business rules sent to the ranking backend.
pub mod rules {
    /// The marker term every karta stavby file name carries.
    pub const RECORD_SHEET_MARKER: &str = "karta stavby";

    /// File name fragments that are never the record sheet.
    pub const EXCLUDED_NAME_FRAGMENTS: [&str; 9] = [
        "ORS tabulka",
        "navratky",
        "vypis materialu",
        "bodove supisy",
        "ZOM",
        "Technicke_udaje",
        "kalkulacka",
        "Merne",
        "Poplatky",
    ];

    /// Folders whose spreadsheets are never the record sheet.
    pub const EXCLUDED_PATH_SEGMENTS: [&str; 4] =
        ["Oznamenia", "F - Bodove supisy", "PL", "Prepočet"];

    pub const FOLDER_SYSTEM_PROMPT: &str =
        "Si pomocník pre výber správneho priečinka. Odpovedaj len číslom.";
    pub const FILE_SYSTEM_PROMPT: &str =
        "Si pomocník pre výber správneho Excel súboru. Odpovedaj len číslom.";

    pub const FOLDER_MAX_TOKENS: u32 = 10;
    pub const FILE_MAX_TOKENS: u32 = 1000;
}

/// A fully rendered request for the ranking backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// The raw text-completion capability behind a ranker.
#[async_trait]
pub trait RankingBackend: Send + Sync {
    async fn complete(&self, prompt: &RankingPrompt) -> Result<String, CoreError>;
}

/// The outcome of a ranking call.
#[derive(Debug)]
pub struct Ranked {
    pub index: usize,
    /// Why the first candidate was returned instead of a real choice.
    pub degraded: Option<CoreError>,
}

impl Ranked {
    fn chosen(index: usize) -> Self {
        Self {
            index,
            degraded: None,
        }
    }

    fn first(reason: CoreError) -> Self {
        Self {
            index: 0,
            degraded: Some(reason),
        }
    }
}

#[async_trait]
pub trait Ranker: Send + Sync {
    async fn rank_folder(
        &self,
        candidates: &[FileDisambiguationProfile],
        code: &ProjectCode,
        project_name: &str,
    ) -> Ranked;

    async fn rank_file(
        &self,
        candidates: &[FileReference],
        code: &ProjectCode,
        project_name: &str,
    ) -> Ranked;
}

/// The ranker used when no backend is configured.
pub struct FirstCandidateRanker;

#[async_trait]
impl Ranker for FirstCandidateRanker {
    async fn rank_folder(
        &self,
        _candidates: &[FileDisambiguationProfile],
        _code: &ProjectCode,
        _project_name: &str,
    ) -> Ranked {
        tracing::warn!("No ranking backend configured, using the first folder");
        Ranked::first(CoreError::RankerUnavailable(
            "no ranking backend configured".to_string(),
        ))
    }

    async fn rank_file(
        &self,
        _candidates: &[FileReference],
        _code: &ProjectCode,
        _project_name: &str,
    ) -> Ranked {
        tracing::warn!("No ranking backend configured, using the first file");
        Ranked::first(CoreError::RankerUnavailable(
            "no ranking backend configured".to_string(),
        ))
    }
}

/// A ranker that asks a text-completion backend for a candidate number.
pub struct BackendRanker<B> {
    backend: B,
}

impl<B: RankingBackend> BackendRanker<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    async fn ask(&self, prompt: RankingPrompt, len: usize) -> Ranked {
        let answer = match self.backend.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => return Ranked::first(e),
        };
        match interpret_answer(&answer, len) {
            Ok(index) => Ranked::chosen(index),
            Err(e) => Ranked::first(e),
        }
    }
}

#[async_trait]
impl<B: RankingBackend> Ranker for BackendRanker<B> {
    async fn rank_folder(
        &self,
        candidates: &[FileDisambiguationProfile],
        code: &ProjectCode,
        project_name: &str,
    ) -> Ranked {
        let ranked = self
            .ask(folder_prompt(candidates, code, project_name), candidates.len())
            .await;
        match &ranked.degraded {
            None => tracing::info!("🤖 Ranker chose folder: {}", candidates[ranked.index].folder.name),
            Some(reason) => tracing::warn!("⚠ {}, using the first folder", reason),
        }
        ranked
    }

    async fn rank_file(
        &self,
        candidates: &[FileReference],
        code: &ProjectCode,
        project_name: &str,
    ) -> Ranked {
        let ranked = self
            .ask(file_prompt(candidates, code, project_name), candidates.len())
            .await;
        match &ranked.degraded {
            None => tracing::info!("🤖 Ranker chose file: {}", candidates[ranked.index].path),
            Some(reason) => tracing::warn!("⚠ {}, using the first file", reason),
        }
        ranked
    }
}

/// Turns a backend answer into a zero-based index.
///
/// Every non-digit character is dropped first, so `" 2."` reads as `2`.
pub fn interpret_answer(answer: &str, len: usize) -> Result<usize, CoreError> {
    let digits: String = answer.chars().filter(char::is_ascii_digit).collect();
    let choice: usize = digits
        .parse()
        .map_err(|_| CoreError::RankerInvalidAnswer(answer.to_string()))?;

    if (1..=len).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(CoreError::RankerInvalidAnswer(answer.to_string()))
    }
}

/// Renders the folder-disambiguation prompt.
pub fn folder_prompt(
    candidates: &[FileDisambiguationProfile],
    code: &ProjectCode,
    project_name: &str,
) -> RankingPrompt {
    let folders_text = candidates
        .iter()
        .enumerate()
        .map(|(i, profile)| {
            let mut entry = format!("{}. {}", i + 1, profile.folder.name);
            if profile.spreadsheet_names.is_empty() {
                entry.push_str("\n   (žiadne XLSX súbory)");
            } else {
                entry.push_str(&format!(
                    "\n   XLSX súbory ({}):",
                    profile.spreadsheet_names.len()
                ));
                for name in &profile.spreadsheet_names {
                    entry.push_str(&format!("\n     - {}", name));
                }
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        r#"Máš zoznam priečinkov zo SharePointa a potrebuješ vybrať ten správny na základe značky a názvu stavby.

Značka stavby: {raw}
Názov stavby: {project_name}

Nájdené priečinky:
{folders_text}

Úloha: Vyber priečinok, ktorý:
1. PRIORITNE obsahuje súbor "{marker}" s touto značkou (napr. "{marker} - {code}.xlsx")
2. Najlepšie zodpovedá danej značke a názvu stavby
3. Názov stavby sa môže mierne líšiť (skratky, preklepy, atď.)

DÔLEŽITÉ: Ak značka obsahuje rok (napr. "ZP12715/2024"), uprednostni priečinok ktorý obsahuje tento rok v názve alebo v štruktúre cesty.

Odpoveď MUSÍ byť len jedno číslo (1-{count}) bez akéhokoľvek iného textu alebo vysvetlenia."#,
        raw = code.raw(),
        code = code.code(),
        marker = rules::RECORD_SHEET_MARKER,
        count = candidates.len(),
    );

    RankingPrompt {
        system: rules::FOLDER_SYSTEM_PROMPT.to_string(),
        user,
        max_tokens: rules::FOLDER_MAX_TOKENS,
    }
}

/// Renders the file-selection prompt; files are listed by traversal path.
pub fn file_prompt(
    candidates: &[FileReference],
    code: &ProjectCode,
    project_name: &str,
) -> RankingPrompt {
    let files_text = candidates
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let shown = if file.path.is_empty() {
                &file.name
            } else {
                &file.path
            };
            format!("{}. {}", i + 1, shown)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        r#"Máš zoznam Excel súborov (.xlsx) zo SharePointa a potrebuješ vybrať správny súbor "Karta stavby" alebo hlavný súbor pre správu stavby.

Značka stavby: {code}
Názov stavby: {project_name}

Nájdené súbory (s cestou):
{files_text}

Úloha: Vyber súbor, ktorý je hlavným súborom pre správu tejto stavby.

PRIORITA (od najvyššej po najnižšiu):
1. Súbor s názvom obsahujúcim "{marker}" + značka stavby
2. Súbor s názvom obsahujúcim "{marker}"
3. Súbor s názvom obsahujúcim "tabulka" + značka stavby v akejkoľvek ceste
4. Akýkoľvek súbor v adresári "ZIADOSTI" so značkou stavby

VYLÚČ:
- Súbory s názvom obsahujúcim {excluded_names}
- Súbory v adresároch: {excluded_paths}

Odpoveď MUSÍ byť len jedno číslo (1-{count}) bez akéhokoľvek iného textu alebo vysvetlenia."#,
        code = code.code(),
        marker = rules::RECORD_SHEET_MARKER,
        excluded_names = quoted_list(&rules::EXCLUDED_NAME_FRAGMENTS),
        excluded_paths = quoted_list(&rules::EXCLUDED_PATH_SEGMENTS),
        count = candidates.len(),
    );

    RankingPrompt {
        system: rules::FILE_SYSTEM_PROMPT.to_string(),
        user,
        max_tokens: rules::FILE_MAX_TOKENS,
    }
}

fn quoted_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ")
}

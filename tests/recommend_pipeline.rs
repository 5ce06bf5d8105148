//! End-to-end recommendation pipeline tests
//!
//! Every collaborator is an in-process stub, so these tests run offline.
//! The LLM stub counts calls to make the oracle's call budget observable.
//!
//! Run with: cargo test --test recommend_pipeline

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use unicode_normalization::UnicodeNormalization;

use term_abbr::error::{CollaboratorError, CollaboratorResult, OracleResult};
use term_abbr::lexicon::Workbook;
use term_abbr::recommend::MorphemeResolution;
use term_abbr::{
    AbbreviationOracle, Candidate, ChatParams, DictionaryTokenizer, Embedder, Lexicon,
    LexiconCompiler, LlmAbbreviationOracle, LlmClient, Morpheme, PosTag, Recommender,
    RecommenderConfig, TermEntry, Tokenizer,
};

// =============================================================================
// STUBS
// =============================================================================

/// Returns a fixed morpheme list and counts invocations.
struct FixedTokenizer {
    morphemes: Vec<Morpheme>,
    calls: AtomicUsize,
}

impl FixedTokenizer {
    fn new(morphemes: Vec<Morpheme>) -> Arc<Self> {
        Arc::new(Self {
            morphemes,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Tokenizer for FixedTokenizer {
    async fn tokenize(&self, _text: &str) -> CollaboratorResult<Vec<Morpheme>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.morphemes.clone())
    }
}

struct BrokenTokenizer;

#[async_trait]
impl Tokenizer for BrokenTokenizer {
    async fn tokenize(&self, _text: &str) -> CollaboratorResult<Vec<Morpheme>> {
        Err(CollaboratorError::Status {
            service: "tokenizer",
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Word-to-vector table with an optional per-word delay. Unknown words fail.
#[derive(Default)]
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    delays: HashMap<String, Duration>,
}

impl TableEmbedder {
    fn with(mut self, word: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(word.to_string(), vector);
        self
    }

    fn delayed(mut self, word: &str, delay: Duration) -> Self {
        self.delays.insert(word.to_string(), delay);
        self
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> CollaboratorResult<Vec<f32>> {
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                service: "embedding",
                message: format!("no vector for '{text}'"),
            })
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

/// Scripted LLM: pops replies in order, answers "NONE" once exhausted.
struct CountingLlm {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl CountingLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    fn stalled() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            delay: Some(Duration::from_secs(3600)),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for CountingLlm {
    async fn chat(&self, prompt: &str, _params: &ChatParams) -> CollaboratorResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "NONE".to_string()))
    }

    fn provider_name(&self) -> &str {
        "counting"
    }
}

/// Fixed word-to-token table.
struct TableOracle {
    tokens: HashMap<String, String>,
}

#[async_trait]
impl AbbreviationOracle for TableOracle {
    async fn propose(&self, word: &str, _candidates: &[Candidate]) -> OracleResult<String> {
        Ok(self.tokens.get(word).cloned().unwrap_or_default())
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

fn lexicon() -> Lexicon {
    Lexicon::from_entries(
        vec![
            TermEntry::new("계좌", "ACNT").with_embedding(vec![1.0, 0.0, 0.0]),
            TermEntry::new("번호", "NO").with_embedding(vec![0.0, 1.0, 0.0]),
            TermEntry::new("사용자", "USER").with_embedding(vec![0.0, 0.0, 1.0]),
            TermEntry::new("해지", "TRMN"),
        ],
        vec!["ACNT_NO".to_string(), "USER_NO".to_string()],
    )
}

fn params() -> ChatParams {
    ChatParams::new("test", 20, 0.2)
}

fn recommender(
    lexicon: Lexicon,
    tokenizer: Arc<dyn Tokenizer>,
    embedder: TableEmbedder,
    llm: Arc<CountingLlm>,
) -> Recommender {
    Recommender::new(
        Arc::new(lexicon),
        tokenizer,
        Arc::new(embedder),
        Arc::new(LlmAbbreviationOracle::new(llm, params())),
    )
}

fn nouns(words: &[&str]) -> Vec<Morpheme> {
    words.iter().map(|w| Morpheme::new(*w, PosTag::Noun)).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn test_exact_matches_join_to_canonical() {
    let lexicon = lexicon();
    let tokenizer = Arc::new(DictionaryTokenizer::from_lexicon(&lexicon));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon, tokenizer, TableEmbedder::default(), llm.clone());

    assert_eq!(r.recommend("계좌번호").await, "ACNT_NO");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_empty_input_yields_empty_without_tokenizing() {
    let tokenizer = FixedTokenizer::new(nouns(&["계좌"]));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon(), tokenizer.clone(), TableEmbedder::default(), llm);

    assert_eq!(r.recommend("").await, "");
    assert_eq!(tokenizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_only_grammatical_morphemes_yield_empty() {
    let tokenizer = FixedTokenizer::new(vec![
        Morpheme::new("을", PosTag::Particle),
        Morpheme::new("습니다", PosTag::VerbalEnding),
        Morpheme::new(".", PosTag::Punctuation),
    ]);
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon(), tokenizer, TableEmbedder::default(), llm.clone());

    let result = r.recommend_detailed("을습니다.").await;
    assert_eq!(result.abbreviation, "");
    assert!(result
        .trace
        .iter()
        .all(|t| t.resolution == MorphemeResolution::Skipped));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_exact_match_is_case_insensitive_and_skips_oracle() {
    let lexicon = Lexicon::from_entries(vec![TermEntry::new("API", "API")], vec![]);
    let tokenizer = FixedTokenizer::new(vec![Morpheme::new("api", PosTag::Foreign)]);
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon, tokenizer, TableEmbedder::default(), llm.clone());

    assert_eq!(r.recommend("api").await, "API");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_sentinel_oracle_stops_after_selection_and_generation() {
    let tokenizer = FixedTokenizer::new(nouns(&["해약"]));
    let embedder = TableEmbedder::default().with("해약", vec![0.9, 0.1, 0.0]);
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon(), tokenizer, embedder, llm.clone());

    // the generation reply is the sentinel too; it is taken as the token
    assert_eq!(r.recommend("해약").await, "NONE");
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_generated_token_joins_exact_tokens() {
    let tokenizer = FixedTokenizer::new(nouns(&["계좌", "해약"]));
    let embedder = TableEmbedder::default().with("해약", vec![0.9, 0.1, 0.0]);
    let llm = CountingLlm::new(&["NONE", "cncl"]);
    let r = recommender(lexicon(), tokenizer, embedder, llm.clone());

    let result = r.recommend_detailed("계좌해약").await;
    assert_eq!(result.abbreviation, "ACNT_CNCL");
    assert!(!result.canonical_match);
    assert_eq!(
        result.trace[1].resolution,
        MorphemeResolution::Proposed {
            abbreviation: "CNCL".to_string(),
            candidates: 1,
        }
    );
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_selected_candidate_contributes_its_abbreviation() {
    let tokenizer = FixedTokenizer::new(nouns(&["고객", "번호"]));
    let embedder = TableEmbedder::default().with("고객", vec![0.1, 0.0, 0.95]);
    let llm = CountingLlm::new(&["사용자"]);
    let r = recommender(lexicon(), tokenizer, embedder, llm.clone());

    let result = r.recommend_detailed("고객번호").await;
    assert_eq!(result.abbreviation, "USER_NO");
    assert!(result.canonical_match);
    assert_eq!(llm.calls(), 1);
    assert!(llm.prompts.lock().unwrap()[0].contains("표준 약어 목록: 사용자"));
}

#[tokio::test]
async fn test_reordered_tokens_resolve_to_canonical() {
    let tokenizer = FixedTokenizer::new(nouns(&["번호", "계좌"]));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon(), tokenizer, TableEmbedder::default(), llm);

    let result = r.recommend_detailed("번호계좌").await;
    assert_eq!(result.abbreviation, "ACNT_NO");
    assert!(result.canonical_match);
}

#[tokio::test]
async fn test_duplicate_terms_are_distinct_candidates() {
    let lexicon = Lexicon::from_entries(
        vec![
            TermEntry::new("번호", "NO").with_embedding(vec![1.0, 0.0]),
            TermEntry::new("번호", "NUM").with_embedding(vec![0.9, 0.1]),
        ],
        vec![],
    );
    let tokenizer = FixedTokenizer::new(nouns(&["넘버"]));
    let embedder = TableEmbedder::default().with("넘버", vec![1.0, 0.05]);
    let llm = CountingLlm::new(&["번호"]);
    let r = recommender(lexicon, tokenizer, embedder, llm.clone());

    assert_eq!(r.recommend("넘버").await, "NO");
    assert!(llm.prompts.lock().unwrap()[0].contains("표준 약어 목록: 번호, 번호"));
}

#[tokio::test]
async fn test_tokenizer_failure_yields_empty() {
    let llm = CountingLlm::new(&[]);
    let r = recommender(
        lexicon(),
        Arc::new(BrokenTokenizer),
        TableEmbedder::default(),
        llm.clone(),
    );

    assert_eq!(r.recommend("계좌번호").await, "");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_drops_only_that_morpheme() {
    let tokenizer = FixedTokenizer::new(nouns(&["사용자", "미상"]));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon(), tokenizer, TableEmbedder::default(), llm.clone());

    let result = r.recommend_detailed("사용자미상").await;
    assert_eq!(result.abbreviation, "USER");
    assert!(matches!(
        result.trace[1].resolution,
        MorphemeResolution::Failed { .. }
    ));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_stalled_oracle_times_out() {
    let tokenizer = FixedTokenizer::new(nouns(&["계좌", "해약"]));
    let embedder = TableEmbedder::default().with("해약", vec![0.9, 0.1, 0.0]);
    let llm = CountingLlm::stalled();
    let r = Recommender::with_config(
        Arc::new(lexicon()),
        tokenizer,
        Arc::new(embedder),
        Arc::new(LlmAbbreviationOracle::new(llm, params())),
        RecommenderConfig {
            call_timeout: Duration::from_millis(50),
            ..RecommenderConfig::default()
        },
    );

    let result = r.recommend_detailed("계좌해약").await;
    assert_eq!(result.abbreviation, "ACNT");
    let MorphemeResolution::Failed { reason } = &result.trace[1].resolution else {
        panic!("expected a failed morpheme");
    };
    assert!(reason.contains("timed out"));
}

#[tokio::test]
async fn test_concurrent_resolution_preserves_order() {
    let tokenizer = FixedTokenizer::new(nouns(&["가", "나", "다"]));
    let embedder = TableEmbedder::default()
        .with("가", vec![1.0])
        .with("나", vec![1.0])
        .with("다", vec![1.0])
        .delayed("가", Duration::from_millis(60))
        .delayed("나", Duration::from_millis(30));
    let oracle = TableOracle {
        tokens: [("가", "GA"), ("나", "NA"), ("다", "DA")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    };
    let r = Recommender::with_config(
        Arc::new(Lexicon::from_entries(vec![], vec!["UNUSED".to_string()])),
        tokenizer,
        Arc::new(embedder),
        Arc::new(oracle),
        RecommenderConfig {
            concurrent_morphemes: true,
            ..RecommenderConfig::default()
        },
    );

    assert_eq!(r.recommend("가나다").await, "GA_NA_DA");
}

#[tokio::test]
async fn test_lexicon_compiled_from_workbook_export() {
    let workbook = Workbook::from_yaml(
        r#"
sheets:
  - name: 공통표준용어
    headers: [공통표준용어명, 공통표준용어설명, 공통표준도메인명, 공통표준용어영문약어명]
    rows:
      - [계좌번호, 계좌를 식별하는 번호., 번호, ACNT_NO]
      - [사용자번호, 사용자를 식별하는 번호., 번호, USER_NO]
  - name: 공통표준단어
    headers: [공통표준단어명, 공통표준단어영문약어명, embedding]
    rows:
      - [계좌, ACNT, "1.0, 0.0"]
      - [번호, "NO", "0.0, 1.0"]
      - [사용자, USER, "-"]
"#,
    )
    .unwrap();
    let lexicon = LexiconCompiler::default().build(&workbook, None).unwrap();
    assert_eq!(lexicon.len(), 3);
    assert_eq!(lexicon.canonical(), ["ACNT_NO", "USER_NO"]);

    let tokenizer = Arc::new(DictionaryTokenizer::from_lexicon(&lexicon));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon, tokenizer, TableEmbedder::default(), llm.clone());

    assert_eq!(r.recommend("번호계좌").await, "ACNT_NO");
    assert_eq!(r.recommend("사용자번호").await, "USER_NO");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_decomposed_lexicon_terms_still_match_exactly() {
    let nfd = |s: &str| s.nfd().collect::<String>();
    let lexicon = Lexicon::from_entries(
        vec![
            TermEntry::new(nfd("계좌"), "ACNT"),
            TermEntry::new(nfd("번호"), "NO"),
        ],
        vec!["ACNT_NO".to_string()],
    );
    let tokenizer = Arc::new(DictionaryTokenizer::from_lexicon(&lexicon));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon, tokenizer, TableEmbedder::default(), llm.clone());

    assert_eq!(r.recommend("계좌번호").await, "ACNT_NO");
    assert_eq!(r.recommend(&nfd("계좌번호")).await, "ACNT_NO");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_compound_ending_in_particle_syllable_resolves_exactly() {
    let lexicon = Lexicon::from_entries(
        vec![
            TermEntry::new("대출", "LOAN"),
            TermEntry::new("한도", "LMT"),
        ],
        vec!["LOAN_LMT".to_string()],
    );
    let tokenizer = Arc::new(DictionaryTokenizer::from_lexicon(&lexicon));
    let llm = CountingLlm::new(&[]);
    let r = recommender(lexicon, tokenizer, TableEmbedder::default(), llm.clone());

    assert_eq!(r.recommend("대출한도").await, "LOAN_LMT");
    assert_eq!(llm.calls(), 0);
}

use crate::cache::{IndexCache, ParsedIndex};
use crate::config::ServerConfig;
use crate::pages;
use crate::security::{content_type_for, resolve_image, ImageDenied};
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use survey_core::config::SurveyConfig;
use survey_core::form::{new_submission_id, parse_submission};
use survey_core::index::sample_pairs;
use survey_core::model::ImagePair;
use survey_core::storage::sessions::new_token;
use survey_core::storage::{SessionStore, SubmissionLog};
use survey_core::SurveyError;

pub const SUBMITTED_COOKIE: &str = "has_submitted";
pub const SESSION_COOKIE: &str = "survey_session";

pub struct AppState {
    pub survey: SurveyConfig,
    pub image_root: PathBuf,
    pub sessions: SessionStore,
    pub log: SubmissionLog,
    pub index_cache: IndexCache,
    pub rng: Mutex<StdRng>,
    pub max_form_bytes: usize,
}

/// What a GET of the form resolves to.
enum FormOutcome {
    Completed,
    Resumed(Vec<ImagePair>),
    Fresh { token: String, pairs: Vec<ImagePair> },
}

/// What a POST of the form resolves to.
enum SubmitOutcome {
    AlreadySubmitted(&'static str),
    Recorded { submission_id: String, pairs: usize },
}

impl AppState {
    pub fn new(survey: SurveyConfig, cfg: &ServerConfig) -> Result<Self> {
        let image_root = std::fs::canonicalize(&survey.image_dir)
            .with_context(|| format!("invalid image_dir {}", survey.image_dir.display()))?;
        let sessions = SessionStore::open(&survey.session_db)
            .with_context(|| format!("failed to open session store {}", survey.session_db.display()))?
            .with_ttl(survey.session_ttl_secs);
        let log = SubmissionLog::new(survey.demographics_file.clone(), survey.responses_file.clone());
        let rng = match survey.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            image_root,
            sessions,
            log,
            index_cache: IndexCache::new(cfg.index_cache_entries),
            rng: Mutex::new(rng),
            max_form_bytes: cfg.max_form_bytes,
            survey,
        })
    }

    /// The current index. Any failure here means the survey cannot be shown.
    fn index(&self) -> Result<ParsedIndex, AppError> {
        self.index_cache
            .load(&self.survey.index_file)
            .map_err(AppError::Unavailable)
    }

    fn open_form(&self, token: Option<&str>) -> Result<FormOutcome, AppError> {
        if let Some(token) = token {
            if let Some(session) = self.sessions.get(token)? {
                if session.is_submitted() {
                    return Ok(FormOutcome::Completed);
                }
                return Ok(FormOutcome::Resumed(session.pairs));
            }
        }

        let index = self.index()?;
        let pairs = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow::anyhow!("sampling rng poisoned"))?;
            sample_pairs(
                &index.entries,
                self.survey.num_pairs,
                self.survey.randomize_sides,
                &mut *rng,
                &self.survey.index_file,
            )
            .map_err(AppError::Unavailable)?
        };

        let token = new_token();
        self.sessions.create(&token, &pairs)?;
        Ok(FormOutcome::Fresh { token, pairs })
    }

    fn submit(&self, token: &str, fields: &[(String, String)]) -> Result<SubmitOutcome, AppError> {
        let session = self
            .sessions
            .get(token)?
            .ok_or(SurveyError::UnknownSession)?;
        if session.is_submitted() {
            return Ok(SubmitOutcome::AlreadySubmitted("session"));
        }

        let submission = parse_submission(fields, &session.pairs, new_submission_id())
            .map_err(SurveyError::from)?;
        let submission_id = submission.submission_id.clone();

        if !self.sessions.claim(token, &submission_id)? {
            // Lost a race with another POST, or the session expired meanwhile.
            return match self.sessions.get(token)? {
                Some(s) if s.is_submitted() => Ok(SubmitOutcome::AlreadySubmitted("claim")),
                _ => Err(SurveyError::UnknownSession.into()),
            };
        }

        if let Err(e) = self.log.record(&submission) {
            self.sessions.release(token, &submission_id)?;
            return Err(e.into());
        }
        Ok(SubmitOutcome::Recorded {
            submission_id,
            pairs: session.pairs.len(),
        })
    }

    fn image_path(&self, requested: &str) -> Result<Result<PathBuf, ImageDenied>, AppError> {
        let index = self.index()?;
        Ok(resolve_image(&self.image_root, &index.catalog, requested))
    }
}

/// Runs `f` on the blocking pool. SQLite, the index file and the CSV logs
/// are all synchronous.
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))?
}

pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_form_bytes;
    Router::new()
        .route("/", get(survey_form).post(submit_survey))
        .route("/images/*filename", get(serve_image))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub struct Server;

impl Server {
    pub async fn run(survey: SurveyConfig, cfg: ServerConfig) -> Result<()> {
        let state = Arc::new(AppState::new(survey, &cfg)?);
        let listener = tokio::net::TcpListener::bind(&cfg.bind)
            .await
            .with_context(|| format!("failed to bind {}", cfg.bind))?;

        let addr = listener.local_addr()?;
        let completed = state.sessions.count_submitted()?;
        tracing::info!(
            event = "server_listening",
            addr = %addr,
            completed_sessions = completed
        );

        axum::serve(listener, router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!(event = "server_shutdown");
            })
            .await?;
        Ok(())
    }
}

/// Failure of a request handler, rendered as an HTML status page.
#[derive(Debug)]
pub enum AppError {
    /// The index could not be loaded or sampled.
    Unavailable(SurveyError),
    Survey(SurveyError),
    Internal(anyhow::Error),
}

impl From<SurveyError> for AppError {
    fn from(e: SurveyError) -> Self {
        AppError::Survey(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            AppError::Survey(e @ SurveyError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "Incomplete survey", e.to_string())
            }
            AppError::Survey(SurveyError::UnknownSession) => (
                StatusCode::BAD_REQUEST,
                "Session expired",
                "Your survey session has expired. Please reload the page and try again.".to_string(),
            ),
            AppError::Unavailable(e) => {
                tracing::error!(event = "survey_unavailable", error = %e);
                (StatusCode::SERVICE_UNAVAILABLE, "Survey unavailable", e.to_string())
            }
            AppError::Survey(e) => {
                tracing::error!(event = "request_failed", error = %e);
                internal()
            }
            AppError::Internal(e) => {
                tracing::error!(event = "request_failed", error = ?e);
                internal()
            }
        };
        (status, Html(pages::message_page(title, &message))).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong",
        "Your answers could not be saved. Please try again later.".to_string(),
    )
}

fn has_submitted(jar: &CookieJar) -> bool {
    jar.get(SUBMITTED_COOKIE)
        .map(|c| !c.value().is_empty())
        .unwrap_or(false)
}

fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

fn cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn thank_you() -> Html<String> {
    Html(pages::thank_you_page())
}

async fn survey_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if has_submitted(&jar) {
        return Ok(thank_you().into_response());
    }

    let token = session_token(&jar);
    match blocking(&state, move |st| st.open_form(token.as_deref())).await? {
        FormOutcome::Completed => {
            Ok((jar.add(cookie(SUBMITTED_COOKIE, "true".into())), thank_you()).into_response())
        }
        FormOutcome::Resumed(pairs) => {
            tracing::info!(event = "form_served", pairs = pairs.len(), resumed = true);
            Ok(Html(pages::survey_form(&pairs)).into_response())
        }
        FormOutcome::Fresh { token, pairs } => {
            tracing::info!(event = "form_served", pairs = pairs.len(), resumed = false);
            let jar = jar.add(cookie(SESSION_COOKIE, token));
            Ok((jar, Html(pages::survey_form(&pairs))).into_response())
        }
    }
}

async fn submit_survey(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    if has_submitted(&jar) {
        tracing::info!(event = "resubmission_blocked", reason = "cookie");
        return Ok(thank_you().into_response());
    }

    let token = session_token(&jar).ok_or(SurveyError::UnknownSession)?;
    let outcome = blocking(&state, move |st| st.submit(&token, &fields)).await;
    if let Err(AppError::Survey(SurveyError::Validation(e))) = &outcome {
        tracing::warn!(event = "submission_rejected", error = %e);
    }

    match outcome? {
        SubmitOutcome::AlreadySubmitted(reason) => {
            tracing::info!(event = "resubmission_blocked", reason = reason);
            Ok((jar.add(cookie(SUBMITTED_COOKIE, "true".into())), thank_you()).into_response())
        }
        SubmitOutcome::Recorded { submission_id, pairs } => {
            tracing::info!(
                event = "submission_recorded",
                submission_id = %submission_id,
                pairs = pairs
            );
            let jar = jar.add(cookie(SUBMITTED_COOKIE, "true".into()));
            Ok((jar, Redirect::to("/")).into_response())
        }
    }
}

async fn serve_image(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, AppError> {
    let requested = filename.clone();
    let path = match blocking(&state, move |st| st.image_path(&requested)).await? {
        Ok(p) => p,
        Err(denied) => {
            tracing::warn!(event = "image_denied", code = denied.code, requested = %filename);
            return Ok((denied.status, denied.message).into_response());
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            tracing::error!(event = "image_read_failed", path = %path.display(), error = %e);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use frontdesk_application::{
    Clock, ListController, ListControllerConfig, RecordFormPipeline, ReferenceDataGateway,
    RemoteCollectionGateway, SessionService, TokioClock,
};
use frontdesk_core::{AppError, AppResult, RecordId, SessionContext, SessionUser, UserRole};
use frontdesk_domain::{
    EntityKind, FieldValue, FileHandle, ReferenceCatalog, SortDirection, SortSpec,
};
use frontdesk_infrastructure::{
    HttpApiClient, HttpAuthGateway, HttpCollectionGateway, HttpReferenceDataGateway,
    InMemoryCollectionGateway,
};

use crate::cli::Command;
use crate::console_config::{ConsoleConfig, GatewayMode};
use crate::record_file::RecordFile;

/// Collection adapter of one command, with its local file when offline.
enum CollectionBackend {
    Remote(Arc<HttpCollectionGateway>),
    Local {
        gateway: Arc<InMemoryCollectionGateway>,
        file: RecordFile,
    },
}

impl CollectionBackend {
    fn gateway(&self) -> Arc<dyn RemoteCollectionGateway> {
        match self {
            Self::Remote(gateway) => gateway.clone(),
            Self::Local { gateway, .. } => gateway.clone(),
        }
    }

    /// Writes local records back to their file after a mutation.
    async fn persist(&self) -> AppResult<()> {
        let Self::Local { gateway, file } = self else {
            return Ok(());
        };

        let records = gateway.records().await;
        file.save(&records).await?;
        debug!(path = %file.path().display(), records = records.len(), "local records saved");
        Ok(())
    }
}

pub struct Console {
    config: ConsoleConfig,
    client: HttpApiClient,
    clock: Arc<dyn Clock>,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> AppResult<Self> {
        let client = HttpApiClient::new(
            config.api_url.as_str(),
            config.api_timeout,
            SessionContext::anonymous(),
        )?;

        Ok(Self {
            config,
            client,
            clock: Arc::new(TokioClock),
        })
    }

    pub async fn run(&self, command: Command) -> AppResult<()> {
        match command {
            Command::List {
                entity,
                page,
                page_size,
                search,
                sort,
                ascending,
                filters,
            } => {
                let direction = if ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                };
                let sort = sort
                    .map(|field| SortSpec::new(field, direction))
                    .transpose()?;
                self.list(entity, page, page_size, search, sort, filters).await
            }
            Command::Show { entity, id } => self.show(entity, id).await,
            Command::Save {
                entity,
                id,
                values,
                files,
            } => self.save(entity, id, values, files).await,
            Command::Delete { entity, id, yes } => self.delete(entity, id, yes).await,
            Command::Login { email, password } => self.login(email, password).await,
            Command::Logout => self.logout().await,
            Command::ForgotPassword { email } => {
                let message = self.sessions().request_password_reset(email.as_str()).await?;
                println!("{message}");
                Ok(())
            }
            Command::ResetPassword {
                token,
                password,
                confirm,
            } => {
                let message = self
                    .sessions()
                    .reset_password(token.as_str(), password.as_str(), confirm.as_str())
                    .await?;
                println!("{message}");
                Ok(())
            }
            Command::Options { catalog } => self.options(catalog).await,
        }
    }

    async fn list(
        &self,
        entity: EntityKind,
        page: u32,
        page_size: Option<u32>,
        search: Option<String>,
        sort: Option<SortSpec>,
        filters: Vec<(String, String)>,
    ) -> AppResult<()> {
        let controller = self.list_controller(entity).await?;

        let mut query = controller.state().await.query().clone();
        if let Some(page_size) = page_size {
            query = query.with_page_size(page_size)?;
        }
        if let Some(search) = search {
            query = query.with_search_text(search);
        }
        if sort.is_some() {
            query = query.with_sort(sort);
        }
        for (name, value) in filters {
            query = query.with_filter(name, Some(value));
        }
        controller.open(query.with_page(page)?).await;

        let state = controller.state().await;
        if let Some(error) = state.error() {
            return Err(error.clone());
        }
        let Some(result) = state.result() else {
            return Ok(());
        };

        if result.items().is_empty() {
            println!("No {} records found.", entity.display_name());
        }
        for record in result.items() {
            println!("{:<26} {}", record.id().as_str(), record.label());
        }
        println!(
            "Page {} of {} ({} records)",
            result.page(),
            result.total_pages().max(1),
            result.total_count()
        );

        Ok(())
    }

    async fn show(&self, entity: EntityKind, id: String) -> AppResult<()> {
        let backend = self.collection(entity).await?;
        let mut pipeline = RecordFormPipeline::new(backend.gateway(), self.clock.clone());
        pipeline.load_for_edit(&RecordId::new(id)?).await?;
        print_form(&pipeline);
        Ok(())
    }

    async fn save(
        &self,
        entity: EntityKind,
        id: Option<String>,
        values: Vec<(String, String)>,
        files: Vec<(String, String)>,
    ) -> AppResult<()> {
        let backend = self.collection(entity).await?;
        let mut pipeline = RecordFormPipeline::new(backend.gateway(), self.clock.clone());
        if let Some(id) = id {
            pipeline.load_for_edit(&RecordId::new(id)?).await?;
        }

        for (path, raw) in values {
            let value = pipeline
                .schema()
                .field(path.as_str())
                .ok_or_else(|| {
                    AppError::Validation(format!("{entity} form has no field '{path}'"))
                })?
                .parse_input(raw.as_str())?;
            pipeline.set_field(path.as_str(), value)?;
        }
        for (path, file) in files {
            let attachment = read_attachment(Path::new(file.as_str())).await?;
            pipeline.set_field(path.as_str(), FieldValue::File(attachment))?;
        }

        let outcome = pipeline.submit().await;
        for error in outcome.field_errors() {
            eprintln!("  {error}");
        }
        let summary = outcome.summary();
        let record = outcome.into_result()?;
        backend.persist().await?;
        println!("{summary}");
        println!("id: {}", record.id());

        Ok(())
    }

    async fn delete(&self, entity: EntityKind, id: String, yes: bool) -> AppResult<()> {
        let backend = self.collection(entity).await?;
        let gateway = backend.gateway();
        let record = gateway.get_by_id(&RecordId::new(id)?).await?;
        let controller =
            ListController::new(gateway, self.clock.clone(), self.list_config(entity))?;

        let pending = controller.request_removal(&record);
        if !yes && !confirm(pending.prompt().as_str()).await? {
            println!("Delete cancelled.");
            return Ok(());
        }

        controller.remove(pending.confirm()).await?;
        backend.persist().await?;
        println!("Deleted {} '{}'.", entity.display_name(), record.label());
        Ok(())
    }

    async fn login(&self, email: String, password: Option<String>) -> AppResult<()> {
        let password = match password {
            Some(password) => password,
            None => read_line("Password: ").await?,
        };

        let session = self.sessions().sign_in(email.as_str(), password.as_str()).await?;
        if let Some(user) = session.user() {
            println!("Signed in as {} ({})", user.name(), user.role());
        }
        if let Some(token) = session.bearer_token() {
            println!("FRONTDESK_AUTH_TOKEN={token}");
        }

        Ok(())
    }

    async fn logout(&self) -> AppResult<()> {
        let token = self.config.auth_token.as_deref().ok_or_else(|| {
            AppError::Validation("FRONTDESK_AUTH_TOKEN is required to sign out".to_owned())
        })?;

        self.sessions()
            .sign_out(&SessionContext::authenticated(token, None))
            .await;
        println!("Signed out.");
        Ok(())
    }

    async fn options(&self, catalog: ReferenceCatalog) -> AppResult<()> {
        let session = self.http_session().await?;
        let gateway = HttpReferenceDataGateway::new(self.client.with_session(session));

        for option in gateway.options(catalog).await? {
            if option.id == option.label {
                println!("{}", option.label);
            } else {
                println!("{:<26} {}", option.id, option.label);
            }
        }

        Ok(())
    }

    fn sessions(&self) -> SessionService {
        SessionService::new(Arc::new(HttpAuthGateway::new(self.client.clone())))
    }

    async fn http_session(&self) -> AppResult<SessionContext> {
        match self.config.auth_token.as_deref() {
            Some(token) => self.sessions().resume(token).await,
            None => Ok(SessionContext::anonymous()),
        }
    }

    async fn collection(&self, entity: EntityKind) -> AppResult<CollectionBackend> {
        Ok(match self.config.gateway {
            GatewayMode::Http => {
                let session = self.http_session().await?;
                CollectionBackend::Remote(Arc::new(HttpCollectionGateway::new(
                    self.client.with_session(session),
                    entity,
                )))
            }
            GatewayMode::Memory => {
                let file = RecordFile::new(&self.config.data_dir, entity);
                let records = file.load().await?;
                let operator = SessionUser::new("local", "Local operator", None, UserRole::Admin);
                CollectionBackend::Local {
                    gateway: Arc::new(InMemoryCollectionGateway::with_records(
                        entity,
                        SessionContext::authenticated("local", Some(operator)),
                        records,
                    )),
                    file,
                }
            }
        })
    }

    fn list_config(&self, entity: EntityKind) -> ListControllerConfig {
        ListControllerConfig::for_entity(entity)
            .with_reset_page_on_delete(self.config.reset_page_on_delete)
            .with_debounce_window(self.config.search_debounce)
    }

    async fn list_controller(&self, entity: EntityKind) -> AppResult<ListController> {
        ListController::new(
            self.collection(entity).await?.gateway(),
            self.clock.clone(),
            self.list_config(entity),
        )
    }
}

fn print_form(pipeline: &RecordFormPipeline) {
    let draft = pipeline.draft();
    if let Some(record_id) = draft.mode().target_id() {
        println!("{} {record_id}", pipeline.entity().display_name());
    }

    for definition in pipeline.schema().base_fields() {
        let value = draft.field(definition.path()).map(display_value).unwrap_or_default();
        println!("  {:<24} {value}", definition.label());
    }
    if let Some(branch) = pipeline.active_branch() {
        println!("{}", branch.label());
        for (definition, value) in branch.fields() {
            println!("  {:<24} {}", definition.label(), display_value(value));
        }
    }
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Empty => String::new(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(number) => number.to_string(),
        FieldValue::Bool(true) => "yes".to_owned(),
        FieldValue::Bool(false) => "no".to_owned(),
        FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        FieldValue::Object(object) => Value::Object(object.clone()).to_string(),
        FieldValue::List(items) => Value::Array(items.clone()).to_string(),
        FieldValue::File(file) => file.file_name().to_owned(),
    }
}

async fn read_attachment(path: &Path) -> AppResult<FileHandle> {
    let bytes = tokio::fs::read(path).await.map_err(|error| {
        AppError::Validation(format!("cannot read '{}': {error}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned());

    Ok(FileHandle::new(file_name, content_type_for(path), bytes))
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn read_line(prompt: &str) -> AppResult<String> {
    let prompt_error =
        |error: std::io::Error| AppError::Internal(format!("failed to write prompt: {error}"));
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await.map_err(prompt_error)?;
    stdout.flush().await.map_err(prompt_error)?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read input: {error}")))?;

    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn confirm(question: &str) -> AppResult<bool> {
    let answer = read_line(format!("{question} [y/N] ").as_str()).await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

//! The form session: open, edit, submit, close.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::client::{ApiClient, MutationMethod, MutationOutcome};
use crate::endpoints::{Endpoint, PkValue, api_url};
use crate::error::ClientError;
use crate::form::fields::{FieldDescriptor, FieldSpec};
use crate::form::schema::FormSchema;
use crate::notify::Notification;

/// How a form session is opened.
#[derive(Debug, Clone)]
pub struct FormOptions {
    pub endpoint: Endpoint,
    pub pk: Option<PkValue>,
    pub method: MutationMethod,
    /// Issue a metadata request on open (default true).
    pub fetch_schema: bool,
    /// Fetch the existing object and merge its values (edit mode).
    pub fetch_initial: bool,
    /// Notification to queue on successful submission.
    pub success_message: Option<String>,
}

impl FormOptions {
    /// A create form against a collection endpoint.
    pub fn create(endpoint: Endpoint) -> Self {
        FormOptions {
            endpoint,
            pk: None,
            method: MutationMethod::Create,
            fetch_schema: true,
            fetch_initial: false,
            success_message: None,
        }
    }

    /// An edit form against an existing object.
    pub fn edit(endpoint: Endpoint, pk: impl Into<PkValue>) -> Self {
        FormOptions {
            endpoint,
            pk: Some(pk.into()),
            method: MutationMethod::Update,
            fetch_schema: true,
            fetch_initial: true,
            success_message: None,
        }
    }

    /// A delete confirmation against an existing object.
    pub fn delete(endpoint: Endpoint, pk: impl Into<PkValue>) -> Self {
        FormOptions {
            endpoint,
            pk: Some(pk.into()),
            method: MutationMethod::Delete,
            fetch_schema: false,
            fetch_initial: false,
            success_message: None,
        }
    }

    /// Suppress the schema-discovery request.
    pub fn without_schema(mut self) -> Self {
        self.fetch_schema = false;
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Resolve the target URL. Panics when an update/delete form is opened
    /// without a primary key; that is a programming error, not user input.
    fn resolve_url(&self) -> String {
        if self.method.requires_pk() {
            let pk = self.pk.as_ref().unwrap_or_else(|| {
                panic!(
                    "{:?} form for endpoint {} requires a primary key",
                    self.method, self.endpoint
                )
            });
            api_url(self.endpoint, Some(pk))
        } else {
            api_url(self.endpoint, None)
        }
    }
}

/// Submission lifecycle of a form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Outcome of a submission attempt, pattern-matched by the view.
#[derive(Debug)]
pub enum SubmitResult {
    /// 2xx; carries the created/updated record when the server returned one.
    /// The owning view should refresh dependent tables.
    Success(Option<Value>),
    /// Validation failure; errors are now mapped onto the fields and the
    /// form stays open for correction.
    Invalid,
    /// Other failure; a generic notification was queued. `None` status
    /// means the server was never reached.
    Failed { status: Option<u16> },
    /// Nothing was sent: a submission was already in flight, or the
    /// session is closed.
    Ignored,
}

/// A prepared submission, handed out by [`FormSession::begin_submit`].
#[derive(Debug)]
pub struct SubmitRequest {
    pub method: MutationMethod,
    pub path: String,
    pub body: Option<Value>,
}

/// One open form: merged field descriptors, submission state and
/// server-reported errors. Owned by the view that opened it; closing it
/// prevents any in-flight completion from mutating state.
#[derive(Debug)]
pub struct FormSession {
    url: String,
    method: MutationMethod,
    success_message: Option<String>,
    fields: Vec<FieldDescriptor>,
    non_field_errors: Vec<String>,
    state: SubmitState,
    notifications: Vec<Notification>,
    open: bool,
}

impl FormSession {
    /// Build a session from already-resolved parts. [`FormSession::open`]
    /// is the network-backed path; this is the seam for callers (and tests)
    /// that bring their own schema.
    pub fn new(
        options: FormOptions,
        field_specs: Vec<(String, FieldSpec)>,
        schema: &FormSchema,
    ) -> Self {
        let url = options.resolve_url();
        let fields = field_specs
            .into_iter()
            .map(|(name, spec)| {
                let entry = schema.get(&name);
                FieldDescriptor::merge(name, spec, entry)
            })
            .collect();

        FormSession {
            url,
            method: options.method,
            success_message: options.success_message,
            fields,
            non_field_errors: Vec::new(),
            state: SubmitState::Idle,
            notifications: Vec::new(),
            open: true,
        }
    }

    /// Open a form: discover the server schema (unless suppressed), merge
    /// it with the caller's field specs, and in edit mode fetch the current
    /// object state.
    ///
    /// Schema and initial-data failures are non-fatal: the form degrades to
    /// caller-supplied metadata and a notification is queued.
    pub async fn open(
        client: &ApiClient,
        options: FormOptions,
        field_specs: Vec<(String, FieldSpec)>,
    ) -> FormSession {
        let url = options.resolve_url();

        let mut schema_notification = None;
        let schema = if options.fetch_schema {
            match client.options_json(&url).await {
                Ok(body) => FormSchema::from_options_response(&body, options.method),
                Err(e) => {
                    warn!(url = %url, error = %e, "schema discovery failed, degrading");
                    schema_notification = Some(Notification::error(
                        "Form error",
                        "Field definitions could not be loaded from the server",
                    ));
                    FormSchema::empty()
                }
            }
        } else {
            FormSchema::empty()
        };

        let fetch_initial = options.fetch_initial;
        let mut session = FormSession::new(options, field_specs, &schema);
        session.notifications.extend(schema_notification);

        if fetch_initial {
            match client.get_json(&url, &[]).await {
                Ok(Value::Object(record)) => session.adopt_initial_data(&record),
                Ok(_) => debug!(url = %url, "initial data was not an object, ignoring"),
                Err(e) => {
                    warn!(url = %url, error = %e, "initial data fetch failed");
                    session.notifications.push(Notification::error(
                        "Form error",
                        "Existing data could not be loaded",
                    ));
                }
            }
        }

        session
    }

    /// Merge fetched object values into fields without an explicit caller
    /// value.
    fn adopt_initial_data(&mut self, record: &Map<String, Value>) {
        for field in &mut self.fields {
            if let Some(value) = record.get(&field.name) {
                field.adopt_initial(value.clone());
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> MutationMethod {
        self.method
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields the view should render, in declaration order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.hidden)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Set a field value, firing its change hook. Returns false for an
    /// unknown field name.
    pub fn set_value(&mut self, name: &str, value: Value) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn errors(&self, name: &str) -> &[String] {
        self.field(name).map(FieldDescriptor::errors).unwrap_or(&[])
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }

    pub fn has_errors(&self) -> bool {
        !self.non_field_errors.is_empty() || self.fields.iter().any(|f| !f.errors().is_empty())
    }

    /// Drain queued notifications for display.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Start a submission. Returns `None` (a no-op, no duplicate request)
    /// while another submission is in flight or after close. Clears all
    /// error state for the new attempt.
    pub fn begin_submit(&mut self) -> Option<SubmitRequest> {
        if !self.open || self.is_submitting() {
            return None;
        }

        self.non_field_errors.clear();
        for field in &mut self.fields {
            field.clear_errors();
        }
        self.state = SubmitState::Submitting;

        let body = match self.method {
            MutationMethod::Delete => None,
            _ => {
                let mut map = Map::new();
                for field in &self.fields {
                    if field.submittable() {
                        // submittable() guarantees a value
                        if let Some(value) = field.value() {
                            map.insert(field.name.clone(), value.clone());
                        }
                    }
                }
                Some(Value::Object(map))
            }
        };

        Some(SubmitRequest {
            method: self.method,
            path: self.url.clone(),
            body,
        })
    }

    /// Feed the network result of a submission back into the session.
    ///
    /// A result arriving after [`FormSession::close`] is dropped without
    /// touching state.
    pub fn apply_submit_response(
        &mut self,
        response: Result<MutationOutcome, ClientError>,
    ) -> SubmitResult {
        if !self.open {
            debug!(url = %self.url, "dropping submit completion for closed form");
            return SubmitResult::Ignored;
        }

        match response {
            Ok(MutationOutcome::Success { body, .. }) => {
                self.state = SubmitState::Succeeded;
                if let Some(message) = &self.success_message {
                    self.notifications
                        .push(Notification::success("Success", message.clone()));
                }
                SubmitResult::Success(body)
            }
            Ok(MutationOutcome::Invalid(errors)) => {
                self.state = SubmitState::Failed;
                for (name, messages) in errors.fields {
                    match self.field_mut(&name) {
                        Some(field) => field.set_errors(messages),
                        // Errors for fields this form does not declare are
                        // still surfaced, as form-level errors.
                        None => self.non_field_errors.extend(messages),
                    }
                }
                self.non_field_errors.extend(errors.non_field);
                SubmitResult::Invalid
            }
            Ok(MutationOutcome::Failed { status }) => {
                self.state = SubmitState::Failed;
                self.notifications.push(Notification::invalid_response(status));
                SubmitResult::Failed {
                    status: Some(status),
                }
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "submission failed");
                self.state = SubmitState::Failed;
                self.notifications
                    .push(Notification::invalid_response(e.status().unwrap_or(0)));
                SubmitResult::Failed { status: e.status() }
            }
        }
    }

    /// Submit the current values: the begin/send/apply cycle in one call.
    pub async fn submit(&mut self, client: &ApiClient) -> SubmitResult {
        let request = match self.begin_submit() {
            Some(request) => request,
            None => return SubmitResult::Ignored,
        };

        let response = client
            .send_mutation(request.method, &request.path, request.body.as_ref())
            .await;
        self.apply_submit_response(response)
    }

    /// Discard the session. Already-submitted data is unaffected; any
    /// in-flight completion will be ignored.
    pub fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrors;
    use serde_json::json;

    fn create_session(fields: Vec<(String, FieldSpec)>) -> FormSession {
        FormSession::new(
            FormOptions::create(Endpoint::PartList),
            fields,
            &FormSchema::empty(),
        )
    }

    fn name_field() -> Vec<(String, FieldSpec)> {
        vec![("name".to_string(), FieldSpec::default())]
    }

    #[test]
    fn test_create_url_targets_collection() {
        let session = create_session(name_field());
        assert_eq!(session.url(), "part/");
    }

    #[test]
    fn test_edit_url_substitutes_pk() {
        let session = FormSession::new(
            FormOptions::edit(Endpoint::PartList, 42),
            name_field(),
            &FormSchema::empty(),
        );
        assert_eq!(session.url(), "part/42/");
    }

    #[test]
    #[should_panic(expected = "requires a primary key")]
    fn test_update_without_pk_panics() {
        let mut options = FormOptions::edit(Endpoint::PartList, 1);
        options.pk = None;
        FormSession::new(options, Vec::new(), &FormSchema::empty());
    }

    #[test]
    fn test_set_value_round_trip() {
        let mut session = create_session(name_field());
        assert!(session.set_value("name", json!("M3 bolt")));
        assert_eq!(
            session.field("name").unwrap().value(),
            Some(&json!("M3 bolt"))
        );
        assert!(!session.set_value("nope", json!(1)));
    }

    #[test]
    fn test_begin_submit_builds_body_from_submittable_fields() {
        let mut session = create_session(vec![
            ("name".to_string(), FieldSpec::default()),
            ("parent".to_string(), FieldSpec::hidden_with_value(json!(5))),
            ("notes".to_string(), FieldSpec::default()),
        ]);
        session.set_value("name", json!("Bracket"));

        let request = session.begin_submit().unwrap();
        assert_eq!(request.path, "part/");
        let body = request.body.unwrap();
        // hidden-with-value is submitted, valueless "notes" is not
        assert_eq!(body, json!({"name": "Bracket", "parent": 5}));
    }

    #[test]
    fn test_submit_gate_while_in_flight() {
        let mut session = create_session(name_field());
        assert!(session.begin_submit().is_some());
        assert!(session.is_submitting());
        // Second attempt while in flight is a no-op
        assert!(session.begin_submit().is_none());
    }

    #[test]
    fn test_validation_errors_mapped_to_fields() {
        let mut session = create_session(name_field());
        session.begin_submit().unwrap();

        let errors = ValidationErrors::from_body(&json!({
            "name": ["This field is required."],
            "non_field_errors": ["Part already exists"]
        }))
        .unwrap();
        let result = session.apply_submit_response(Ok(MutationOutcome::Invalid(errors)));

        assert!(matches!(result, SubmitResult::Invalid));
        assert!(!session.is_submitting());
        assert_eq!(session.errors("name"), &["This field is required."]);
        assert_eq!(session.non_field_errors(), &["Part already exists"]);
        assert!(session.is_open());
    }

    #[test]
    fn test_unknown_field_errors_become_non_field() {
        let mut session = create_session(name_field());
        session.begin_submit().unwrap();

        let errors =
            ValidationErrors::from_body(&json!({"category": ["Invalid category"]})).unwrap();
        session.apply_submit_response(Ok(MutationOutcome::Invalid(errors)));
        assert_eq!(session.non_field_errors(), &["Invalid category"]);
    }

    #[test]
    fn test_errors_cleared_on_next_attempt() {
        let mut session = create_session(name_field());
        session.begin_submit().unwrap();
        let errors =
            ValidationErrors::from_body(&json!({"name": ["This field is required."]})).unwrap();
        session.apply_submit_response(Ok(MutationOutcome::Invalid(errors)));
        assert!(session.has_errors());

        session.begin_submit().unwrap();
        assert!(!session.has_errors());
    }

    #[test]
    fn test_success_queues_notification() {
        let mut session = FormSession::new(
            FormOptions::create(Endpoint::PartList).with_success_message("Part created"),
            name_field(),
            &FormSchema::empty(),
        );
        session.begin_submit().unwrap();
        let result = session.apply_submit_response(Ok(MutationOutcome::Success {
            status: 201,
            body: Some(json!({"pk": 1, "name": "Bracket"})),
        }));

        match result {
            SubmitResult::Success(Some(body)) => assert_eq!(body["pk"], json!(1)),
            other => panic!("expected Success, got {:?}", other),
        }
        assert_eq!(session.state(), SubmitState::Succeeded);
        let notifications = session.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Part created");
        assert!(session.take_notifications().is_empty());
    }

    #[test]
    fn test_generic_failure_queues_notification() {
        let mut session = create_session(name_field());
        session.begin_submit().unwrap();
        let result = session.apply_submit_response(Ok(MutationOutcome::Failed { status: 500 }));
        assert!(matches!(result, SubmitResult::Failed { status: Some(500) }));
        assert_eq!(session.take_notifications().len(), 1);
    }

    #[test]
    fn test_closed_session_drops_completion() {
        let mut session = create_session(name_field());
        session.begin_submit().unwrap();
        session.close();
        let result = session.apply_submit_response(Ok(MutationOutcome::Success {
            status: 201,
            body: None,
        }));
        assert!(matches!(result, SubmitResult::Ignored));
        assert!(!session.is_open());
    }

    #[test]
    fn test_delete_submits_no_body() {
        let mut session = FormSession::new(
            FormOptions::delete(Endpoint::PartList, 7),
            Vec::new(),
            &FormSchema::empty(),
        );
        let request = session.begin_submit().unwrap();
        assert_eq!(request.method, MutationMethod::Delete);
        assert_eq!(request.path, "part/7/");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_visible_fields_excludes_hidden() {
        let session = create_session(vec![
            ("name".to_string(), FieldSpec::default()),
            ("parent".to_string(), FieldSpec::hidden_with_value(json!(5))),
        ]);
        let visible: Vec<_> = session.visible_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(visible, vec!["name"]);
    }
}

//! The sign-in / sign-up workflow behind the login screen.
//!
//! Each submit runs as one task: validate locally, send one request, report
//! the outcome as a [`Notification`], and on login success hand the role
//! dashboard to the [`Navigate`] sink after the redirect delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use client::auth::{Authenticator, SignupProvider};
use types::domain::{LoginRequest, Session, SignupRequest, User};
use types::error::Error;

use crate::notification::Notification;

pub trait Notify: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigate: Send + Sync {
    fn navigate(&self, url: String);
}

/// Shared in-flight flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct Submitting(Arc<AtomicBool>);

impl Submitting {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sets the flag unless another submission already holds it.
    fn try_begin(&self) -> Option<SubmittingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SubmittingGuard(self.clone()))
    }
}

/// Clears the flag when the request resolves or its task is dropped.
pub struct SubmittingGuard(Submitting);

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

/// What the screen should show for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Spinner,
    RedirectHome(User),
    Form,
}

pub fn gate(session: &Session) -> Gate {
    match session {
        Session { loading: true, .. } => Gate::Spinner,
        Session {
            user: Some(user), ..
        } => Gate::RedirectHome(user.clone()),
        Session { user: None, .. } => Gate::Form,
    }
}

#[derive(Clone)]
pub struct LoginSignupForm {
    authenticator: Arc<dyn Authenticator>,
    provider: Arc<dyn SignupProvider>,
    notifier: Arc<dyn Notify>,
    navigator: Arc<dyn Navigate>,
    submitting: Submitting,
    redirect_delay: Duration,
}

impl LoginSignupForm {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        provider: Arc<dyn SignupProvider>,
        notifier: Arc<dyn Notify>,
        navigator: Arc<dyn Navigate>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            authenticator,
            provider,
            notifier,
            navigator,
            submitting: Submitting::default(),
            redirect_delay,
        }
    }

    #[cfg(test)]
    pub(crate) fn submitting(&self) -> Submitting {
        self.submitting.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    /// Claims the flag for a submission that is about to start, or `None`
    /// while one is in flight.
    pub fn claim(&self) -> Option<SubmittingGuard> {
        self.submitting.try_begin()
    }

    fn report(&self, error: &Error) {
        if error.is_validation() {
            debug!("Not sent: {}", error);
        }
        self.notifier.notify(Notification::from(error));
    }

    /// Runs one login. `claim` holds the submitting flag until the request
    /// resolves.
    pub async fn submit_login(
        &self,
        claim: SubmittingGuard,
        data: LoginRequest,
    ) -> Result<(), Error> {
        if let Err(e) = data.check() {
            drop(claim);
            self.report(&e);
            return Err(e);
        }

        info!("Signing in {} as {}", data.email, data.role);
        let outcome = self.authenticator.login(&data).await;
        drop(claim);

        match outcome {
            Ok(_) => {
                self.notifier
                    .notify(Notification::success("Welcome back!", "Successfully logged in"));
                let url = self.authenticator.dashboard_url(data.role);
                sleep(self.redirect_delay).await;
                info!("Redirecting to {}", url);
                self.navigator.navigate(url);
                Ok(())
            }
            Err(e) => {
                warn!("Login as {} failed: {:?}", data.role, e);
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Returns the session token when the provider signed the user in
    /// without waiting for email confirmation.
    pub async fn submit_signup(
        &self,
        claim: SubmittingGuard,
        data: SignupRequest,
    ) -> Result<Option<String>, Error> {
        if let Err(e) = data.check() {
            drop(claim);
            self.report(&e);
            return Err(e);
        }

        info!("Creating account for {}", data.email);
        let outcome = self
            .provider
            .sign_up(&data.email, &data.password, &data.full_name)
            .await;
        drop(claim);

        match outcome {
            Ok(token) => {
                self.notifier.notify(Notification::success(
                    "Check your email",
                    "We've sent you a confirmation link",
                ));
                Ok(token)
            }
            Err(e) => {
                warn!("Sign-up failed: {:?}", e);
                self.report(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;
    use tokio::time::Instant;
    use types::domain::{MessageBody, Role};

    use super::*;
    use crate::notification::Variant;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Notified(Notification),
        Navigated(String),
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Seen>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Notify for Recorder {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(Seen::Notified(notification));
        }
    }

    impl Navigate for Recorder {
        fn navigate(&self, url: String) {
            self.seen.lock().unwrap().push(Seen::Navigated(url));
        }
    }

    /// Answers from a script, or waits on a channel when gated.
    #[derive(Default)]
    struct FakeBackend {
        logins: Mutex<Vec<LoginRequest>>,
        signups: Mutex<Vec<(String, String, String)>>,
        answer: Mutex<Option<Result<MessageBody, Error>>>,
        gate: Mutex<Option<oneshot::Receiver<Result<MessageBody, Error>>>>,
        signup_gate: Mutex<Option<oneshot::Receiver<Result<Option<String>, Error>>>>,
    }

    impl FakeBackend {
        fn answering(answer: Result<MessageBody, Error>) -> Self {
            Self {
                answer: Mutex::new(Some(answer)),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Authenticator for FakeBackend {
        async fn login(&self, request: &LoginRequest) -> Result<MessageBody, Error> {
            self.logins.lock().unwrap().push(request.clone());
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                return gate
                    .await
                    .unwrap_or_else(|_| Err(Error::Network("dropped".to_string())));
            }
            self.answer
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(MessageBody::default()))
        }

        fn dashboard_url(&self, role: Role) -> String {
            format!("http://backend.test{}", role.dashboard_path())
        }
    }

    #[async_trait]
    impl SignupProvider for FakeBackend {
        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            full_name: &str,
        ) -> Result<Option<String>, Error> {
            self.signups.lock().unwrap().push((
                email.to_string(),
                password.to_string(),
                full_name.to_string(),
            ));
            let gate = self.signup_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                return gate
                    .await
                    .unwrap_or_else(|_| Err(Error::Provider("dropped".to_string())));
            }
            match email {
                "taken@example.com" => Err(Error::Provider("User already registered".to_string())),
                "instant@example.com" => Ok(Some("tok-1".to_string())),
                _ => Ok(None),
            }
        }
    }

    fn form_with(backend: Arc<FakeBackend>, recorder: Arc<Recorder>) -> LoginSignupForm {
        LoginSignupForm::new(
            backend.clone(),
            backend,
            recorder.clone(),
            recorder,
            Duration::from_secs(1),
        )
    }

    async fn login_once(form: &LoginSignupForm, data: LoginRequest) -> Result<(), Error> {
        form.submit_login(form.claim().unwrap(), data).await
    }

    async fn signup_once(
        form: &LoginSignupForm,
        data: SignupRequest,
    ) -> Result<Option<String>, Error> {
        form.submit_signup(form.claim().unwrap(), data).await
    }

    fn login(role: Role) -> LoginRequest {
        LoginRequest {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            role,
        }
    }

    fn signup(password: &str, confirm: &str) -> SignupRequest {
        SignupRequest {
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            full_name: "Ada Lovelace".to_string(),
            confirm_password: confirm.to_string(),
            role: Role::Student,
        }
    }

    #[rstest::rstest]
    #[case(Role::Admin, "http://backend.test/admin-dashboard")]
    #[case(Role::Student, "http://backend.test/student-dashboard")]
    #[case(Role::Company, "http://backend.test/company-dashboard")]
    #[tokio::test(start_paused = true)]
    async fn login_success_notifies_then_redirects_after_delay(
        #[case] role: Role,
        #[case] dashboard: &str,
    ) {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend.clone(), recorder.clone());

        let started = Instant::now();
        login_once(&form, login(role)).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(
            recorder.seen(),
            vec![
                Seen::Notified(Notification::success("Welcome back!", "Successfully logged in")),
                Seen::Navigated(dashboard.to_string()),
            ]
        );
        let sent = backend.logins.lock().unwrap().clone();
        assert_eq!(sent, vec![login(role)]);
        assert!(!form.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_waits_for_the_delay() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        let task = tokio::spawn({
            let form = form.clone();
            async move { login_once(&form, login(Role::Admin)).await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(recorder.seen().len(), 1);
        assert!(!form.is_submitting());

        task.await.unwrap().unwrap();
        assert!(matches!(recorder.seen()[1], Seen::Navigated(_)));
    }

    #[tokio::test]
    async fn rejected_login_shows_server_message() {
        let backend = Arc::new(FakeBackend::answering(Err(Error::Rejected {
            status: 401,
            message: Some("bad creds".to_string()),
        })));
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        assert!(login_once(&form, login(Role::Student)).await.is_err());
        assert_eq!(
            recorder.seen(),
            vec![Seen::Notified(Notification::failure("Login Failed", "bad creds"))]
        );
    }

    #[tokio::test]
    async fn rejected_login_without_message_uses_fallback() {
        let backend = Arc::new(FakeBackend::answering(Err(Error::Rejected {
            status: 401,
            message: None,
        })));
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        let _ = login_once(&form, login(Role::Company)).await;
        assert_eq!(
            recorder.seen(),
            vec![Seen::Notified(Notification::failure(
                "Login Failed",
                "Invalid credentials"
            ))]
        );
    }

    #[tokio::test]
    async fn network_failure_reports_and_clears_flag() {
        let backend = Arc::new(FakeBackend::answering(Err(Error::Network(
            "connection refused".to_string(),
        ))));
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        let err = login_once(&form, login(Role::Admin)).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(!form.is_submitting());
        match &recorder.seen()[..] {
            [Seen::Notified(n)] => {
                assert_eq!(n.description, "Network error. Please try again.");
                assert_eq!(n.variant, Variant::Destructive);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn flag_is_set_only_while_request_is_in_flight() {
        let (release, gate) = oneshot::channel();
        let backend = Arc::new(FakeBackend::default());
        *backend.gate.lock().unwrap() = Some(gate);
        let recorder = Arc::new(Recorder::default());
        let form = LoginSignupForm::new(
            backend.clone(),
            backend,
            recorder.clone(),
            recorder,
            Duration::ZERO,
        );
        let flag = form.submitting();
        assert!(!flag.get());

        let in_flight = flag.clone();
        let resolve_request = async move {
            tokio::task::yield_now().await;
            assert!(in_flight.get());
            release
                .send(Err(Error::Rejected {
                    status: 401,
                    message: None,
                }))
                .unwrap();
        };
        let (outcome, ()) =
            tokio::join!(login_once(&form, login(Role::Student)), resolve_request);

        assert!(outcome.is_err());
        assert!(!flag.get());
    }

    #[tokio::test]
    async fn signup_flag_is_set_only_while_request_is_in_flight() {
        let (release, gate) = oneshot::channel();
        let backend = Arc::new(FakeBackend::default());
        *backend.signup_gate.lock().unwrap() = Some(gate);
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());
        let flag = form.submitting();
        assert!(!flag.get());

        let in_flight = flag.clone();
        let provider_answers = async move {
            tokio::task::yield_now().await;
            assert!(in_flight.get());
            release.send(Ok(None)).unwrap();
        };
        let (outcome, ()) = tokio::join!(
            signup_once(&form, signup("secret", "secret")),
            provider_answers
        );

        assert_eq!(outcome, Ok(None));
        assert!(!flag.get());
        assert_eq!(recorder.seen().len(), 1);
    }

    #[test]
    fn claim_is_refused_while_a_submission_holds_the_flag() {
        let form = form_with(Arc::default(), Arc::default());
        let first = form.claim();
        assert!(first.is_some());
        assert!(form.is_submitting());
        assert!(form.claim().is_none());

        drop(first);
        assert!(!form.is_submitting());
        assert!(form.claim().is_some());
    }

    #[tokio::test]
    async fn dropped_submission_clears_flag() {
        let (_release, gate) = oneshot::channel();
        let backend = Arc::new(FakeBackend::default());
        *backend.gate.lock().unwrap() = Some(gate);
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder);

        let pending = tokio::time::timeout(
            Duration::from_millis(20),
            login_once(&form, login(Role::Admin)),
        )
        .await;
        assert!(pending.is_err());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn invalid_login_is_not_sent() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend.clone(), recorder.clone());

        let mut data = login(Role::Admin);
        data.set_password("");
        let err = login_once(&form, data).await.unwrap_err();
        assert!(err.is_validation());
        assert!(backend.logins.lock().unwrap().is_empty());
        assert_eq!(recorder.seen().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_passwords_never_reach_provider() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend.clone(), recorder.clone());

        let err = signup_once(&form, signup("secret", "secreT"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::PasswordMismatch);
        assert!(backend.signups.lock().unwrap().is_empty());
        assert_eq!(
            recorder.seen(),
            vec![Seen::Notified(Notification::failure(
                "Password Mismatch",
                "Passwords do not match"
            ))]
        );
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn signup_success_asks_to_check_email() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend.clone(), recorder.clone());

        let token = signup_once(&form, signup("secret", "secret")).await.unwrap();
        assert_eq!(token, None);
        assert_eq!(
            *backend.signups.lock().unwrap(),
            vec![(
                "ada@example.com".to_string(),
                "secret".to_string(),
                "Ada Lovelace".to_string()
            )]
        );
        assert_eq!(
            recorder.seen(),
            vec![Seen::Notified(Notification::success(
                "Check your email",
                "We've sent you a confirmation link"
            ))]
        );
    }

    #[tokio::test]
    async fn signup_hands_back_an_immediate_session_token() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        let mut data = signup("secret", "secret");
        data.set_email("instant@example.com");
        let token = signup_once(&form, data).await.unwrap();
        assert_eq!(token.as_deref(), Some("tok-1"));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn signup_error_shows_provider_message() {
        let backend = Arc::new(FakeBackend::default());
        let recorder = Arc::new(Recorder::default());
        let form = form_with(backend, recorder.clone());

        let mut data = signup("secret", "secret");
        data.set_email("taken@example.com");
        assert!(signup_once(&form, data).await.is_err());
        assert_eq!(
            recorder.seen(),
            vec![Seen::Notified(Notification::failure(
                "Signup Failed",
                "User already registered"
            ))]
        );
    }

    #[test]
    fn gate_follows_session_state() {
        let user = User {
            id: "u1".to_string(),
            email: None,
        };
        assert_eq!(gate(&Session::loading()), Gate::Spinner);
        assert_eq!(
            gate(&Session::resolved(Some(user.clone()))),
            Gate::RedirectHome(user)
        );
        assert_eq!(gate(&Session::resolved(None)), Gate::Form);
    }
}

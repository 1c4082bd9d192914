mod vcloud_api;

// -----------------------------------------------------------------------------

mod helpers {
    pub mod requests;

    use reqwest::Client;
    use std::sync::Arc;
    use vcloud_server::app::App;
    use vcloud_server::config::{Cors, TokenEnv, VcloudEnv};
    use vcloud_server::model::store::MemoryStore;
    use vcloud_server::model::types::{Catalog, NodeEntry, Parameters, SubscriptionEntry};
    use vcloud_server::model::types::{
        PARAMETER_API, PARAMETER_ORGANIZATION, PARAMETER_PASSWORD, PARAMETER_USER, PARAMETER_VM,
    };
    use vcloud_server::state::AppState;
    use vcloud_server::vcloud::client::VcloudClient;
    use vcloud_server::vcloud::session::TOKEN_HEADER;
    use vcloud_server::vcloud::types::VM_URN_PREFIX;
    use vcloud_server::web::auth::token;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const NODE: &str = "service:vm:vcloud:test";
    pub const SUBSCRIPTION: i32 = 1;
    pub const VM: &str = "75aa69b4-8cff-40cd-9338-000000000000";
    pub const LOGIN: &str = "junit";

    pub const QUERY_POWERED_ON: &str =
        include_str!("../fixtures/vcloud-query-vm-poweredon.xml");
    pub const QUERY_POWERED_OFF: &str =
        include_str!("../fixtures/vcloud-query-vm-poweredoff-deployed.xml");
    pub const QUERY_SEARCH: &str = include_str!("../fixtures/vcloud-query-search.xml");
    pub const ADMIN: &str = include_str!("../fixtures/vcloud-admin.xml");

    /// Test helper that runs a server instance in the background, backed by a
    /// `wiremock` vCloud, and provides a `reqwest::Client` for making API calls.
    ///
    pub struct TestApp {
        pub url: String,
        pub client: Client,
        pub vcloud: MockServer,
        token: TokenEnv,
    }

    impl TestApp {
        /// Creates a new `TestApp` with one node visible to [`LOGIN`] and one
        /// subscription bound to [`VM`].
        ///
        pub async fn new() -> Self {
            // Fake vCloud accepting any login.
            let vcloud = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/sessions"))
                .respond_with(ResponseTemplate::new(200).insert_header(TOKEN_HEADER, "token"))
                .mount(&vcloud)
                .await;

            // Create testable application instance.
            let token = TokenEnv {
                secret: "test-secret".into(),
                duration_sec: 60,
            };
            let state = AppState {
                store: Arc::new(MemoryStore::from_catalog(catalog(&vcloud.uri()))),
                vcloud: Arc::new(VcloudClient::new(VcloudEnv {
                    auth_retries: 0,
                    auth_timeout_ms: 1000,
                    request_timeout_ms: 1000,
                    accept_invalid_certs: false,
                    last_version_url: format!("{}/downloads", vcloud.uri()),
                })),
                token: Arc::new(token.clone()),
            };
            let cors: Cors = serde_json::from_value(serde_json::json!({
                "origin": "http://localhost:5173",
                "methods": "GET,POST,DELETE",
                "headers": "authorization,content-type"
            }))
            .unwrap();
            let application = App::build(state, "127.0.0.1:0".parse().unwrap(), &cors)
                .await
                .unwrap();
            let url = application.get_url().unwrap();

            // Spawn application without blocking the execution.
            tokio::spawn(async move {
                application.run().await.unwrap();
            });

            TestApp {
                url,
                client: Client::new(),
                vcloud,
                token,
            }
        }

        /// Bearer token identifying `login`.
        ///
        pub fn bearer(&self, login: &str) -> String {
            token::create(login, &self.token).unwrap()
        }

        /// Answers the lookup of [`VM`] with the given query result.
        ///
        pub async fn mock_vm(&self, query_result: &str) {
            Mock::given(method("GET"))
                .and(path("/api/query"))
                .and(query_param("filter", format!("id=={VM_URN_PREFIX}{VM}").as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_string(query_result))
                .mount(&self.vcloud)
                .await;
        }
    }

    fn catalog(vcloud: &str) -> Catalog {
        Catalog {
            nodes: vec![NodeEntry {
                id: NODE.to_owned(),
                parameters: Parameters::from([
                    (PARAMETER_API.to_owned(), format!("{vcloud}/api")),
                    (PARAMETER_USER.to_owned(), "user".to_owned()),
                    (PARAMETER_PASSWORD.to_owned(), "pass".to_owned()),
                    (PARAMETER_ORGANIZATION.to_owned(), "org".to_owned()),
                ]),
                visible_to: vec![LOGIN.to_owned()],
            }],
            subscriptions: vec![SubscriptionEntry {
                id: SUBSCRIPTION,
                node: NODE.to_owned(),
                parameters: Parameters::from([(PARAMETER_VM.to_owned(), VM.to_owned())]),
                schedules: 3,
            }],
        }
    }
}

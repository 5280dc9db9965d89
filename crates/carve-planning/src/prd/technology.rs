//! Technology hints

use std::collections::BTreeMap;

use super::text::contains_word;

/// Keys present in every hint map, detected or not
pub const PRIMARY_HINTS: [&str; 5] = ["language", "framework", "database", "message_broker", "auth"];

const LANGUAGES: &[(&str, &str)] = &[
    ("python", "Python"),
    ("typescript", "TypeScript"),
    ("javascript", "JavaScript"),
    ("node.js", "JavaScript"),
    ("nodejs", "JavaScript"),
    ("golang", "Go"),
    ("rust", "Rust"),
    ("java", "Java"),
    ("kotlin", "Kotlin"),
    ("c#", "C#"),
    ("csharp", "C#"),
    ("ruby", "Ruby"),
    ("php", "PHP"),
    ("scala", "Scala"),
    ("elixir", "Elixir"),
];

const FRAMEWORKS: &[(&str, &str)] = &[
    ("fastapi", "FastAPI"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("express.js", "Express"),
    ("expressjs", "Express"),
    ("nestjs", "NestJS"),
    ("nest.js", "NestJS"),
    ("next.js", "Next.js"),
    ("spring boot", "Spring Boot"),
    ("ruby on rails", "Rails"),
    ("rails", "Rails"),
    ("laravel", "Laravel"),
    ("asp.net", "ASP.NET"),
    ("actix", "Actix"),
    ("axum", "Axum"),
    ("phoenix", "Phoenix"),
    ("fastify", "Fastify"),
    ("quarkus", "Quarkus"),
    ("micronaut", "Micronaut"),
];

const DATABASES: &[(&str, &str)] = &[
    ("postgresql", "PostgreSQL"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mariadb", "MariaDB"),
    ("mongodb", "MongoDB"),
    ("mongo", "MongoDB"),
    ("sqlite", "SQLite"),
    ("dynamodb", "DynamoDB"),
    ("cassandra", "Cassandra"),
    ("cockroachdb", "CockroachDB"),
    ("sql server", "SQL Server"),
    ("mssql", "SQL Server"),
    ("couchdb", "CouchDB"),
    ("neo4j", "Neo4j"),
    ("firestore", "Firestore"),
    ("redis", "Redis"),
];

const MESSAGE_BROKERS: &[(&str, &str)] = &[
    ("kafka", "Kafka"),
    ("rabbitmq", "RabbitMQ"),
    ("nats", "NATS"),
    ("amazon sqs", "SQS"),
    ("sqs", "SQS"),
    ("pulsar", "Pulsar"),
    ("google pub/sub", "Pub/Sub"),
    ("pub/sub", "Pub/Sub"),
    ("activemq", "ActiveMQ"),
    ("redis streams", "Redis Streams"),
    ("azure service bus", "Azure Service Bus"),
    ("kinesis", "Kinesis"),
];

const AUTH_PATTERNS: &[(&str, &str)] = &[
    ("jwt", "JWT"),
    ("json web token", "JWT"),
    ("oauth2", "OAuth2"),
    ("oauth 2", "OAuth2"),
    ("oauth", "OAuth2"),
    ("openid connect", "OIDC"),
    ("oidc", "OIDC"),
    ("saml", "SAML"),
    ("api key", "API Key"),
    ("api keys", "API Key"),
    ("session-based", "Session"),
    ("session cookie", "Session"),
    ("basic auth", "Basic Auth"),
    ("auth0", "Auth0"),
    ("keycloak", "Keycloak"),
    ("cognito", "Cognito"),
];

/// Term, hint key, hint value
const CONTEXT_CLUES: &[(&str, &str, &str)] = &[
    ("rest api", "api_style", "REST"),
    ("restful", "api_style", "REST"),
    ("graphql", "api_style", "GraphQL"),
    ("grpc", "api_style", "gRPC"),
    ("websocket", "realtime", "WebSocket"),
    ("websockets", "realtime", "WebSocket"),
    ("docker", "containerization", "Docker"),
    ("kubernetes", "orchestration", "Kubernetes"),
    ("k8s", "orchestration", "Kubernetes"),
    ("microservices", "architecture", "microservices"),
    ("microservice", "architecture", "microservices"),
    ("event-driven", "messaging", "event-driven"),
    ("event driven", "messaging", "event-driven"),
    ("cqrs", "data_pattern", "CQRS"),
    ("saga", "transaction_pattern", "saga"),
];

fn first_match(lowered: &str, candidates: &[(&str, &str)]) -> Option<String> {
    candidates
        .iter()
        .find(|(term, _)| contains_word(lowered, term))
        .map(|(_, normalized)| normalized.to_string())
}

pub(crate) fn extract_technology_hints(text: &str) -> BTreeMap<String, Option<String>> {
    let lowered = text.to_lowercase();
    let mut hints = BTreeMap::new();
    hints.insert("language".to_string(), first_match(&lowered, LANGUAGES));
    hints.insert("framework".to_string(), first_match(&lowered, FRAMEWORKS));
    hints.insert("database".to_string(), first_match(&lowered, DATABASES));
    hints.insert("message_broker".to_string(), first_match(&lowered, MESSAGE_BROKERS));
    hints.insert("auth".to_string(), first_match(&lowered, AUTH_PATTERNS));

    for (term, key, value) in CONTEXT_CLUES {
        if !contains_word(&lowered, term) {
            continue;
        }
        let slot = hints.entry(key.to_string()).or_insert(None);
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
    hints
}

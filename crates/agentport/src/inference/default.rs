use std::collections::BTreeMap;

use super::types::{
    BroadeningRule, Category, CategoryPolicy, CategoryRule, InferenceTables, IntegrationRule,
};

/// Characters of body text the classifier looks at.
pub const CLASSIFIER_BODY_PREFIX: usize = 2000;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_tables() -> InferenceTables {
    InferenceTables {
        classifier_body_prefix: CLASSIFIER_BODY_PREFIX,
        builtin_tools: strings(&["read", "write", "shell", "grep", "list_dir", "introspect"]),
        minimal_tools: strings(&["read", "list_dir"]),
        tool_aliases: default_tool_aliases(),
        categories: default_category_rules(),
        policies: default_policies(),
        broadening: default_broadening(),
        integrations: default_integrations(),
    }
}

/// Claude Code tool names → builtin tool ids.
pub fn default_tool_aliases() -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    for (alias, canon) in [
        ("Read", "read"),
        ("Write", "write"),
        ("Edit", "write"),
        ("MultiEdit", "write"),
        ("NotebookEdit", "write"),
        ("Bash", "shell"),
        ("BashOutput", "shell"),
        ("KillBash", "shell"),
        ("Grep", "grep"),
        ("Glob", "list_dir"),
        ("LS", "list_dir"),
    ] {
        m.insert(alias.to_string(), canon.to_string());
    }
    m
}

pub fn default_category_rules() -> Vec<CategoryRule> {
    let rule = |category, keywords: &[&str]| CategoryRule {
        category,
        keywords: strings(keywords),
    };
    vec![
        rule(
            Category::Security,
            &[
                "security",
                "audit",
                "vulnerab",
                "pentest",
                "penetration",
                "threat model",
                "scanner",
                "compliance",
            ],
        ),
        rule(
            Category::Infrastructure,
            &[
                "devops",
                "infra",
                "kubernetes",
                "k8s",
                "terraform",
                "cloud",
                "deploy",
                "docker",
                "helm",
                "ci/cd",
            ],
        ),
        rule(Category::Architecture, &["architect", "design"]),
        rule(
            Category::Quality,
            &["review", "quality", "testing", "tester", "qa"],
        ),
        rule(
            Category::Development,
            &[
                "developer",
                "development",
                "engineer",
                "programmer",
                "coding",
                "frontend",
                "backend",
                "fullstack",
                "full-stack",
            ],
        ),
    ]
}

pub fn default_policies() -> Vec<CategoryPolicy> {
    let read_only = || strings(&["read", "list_dir", "grep", "introspect"]);
    vec![
        CategoryPolicy {
            category: Category::Security,
            tools: read_only(),
            allowed_commands: vec![],
            denied_commands: vec![],
            allowed_paths: vec![],
        },
        CategoryPolicy {
            category: Category::Architecture,
            tools: read_only(),
            allowed_commands: vec![],
            denied_commands: vec![],
            allowed_paths: vec![],
        },
        CategoryPolicy {
            category: Category::Quality,
            tools: read_only(),
            allowed_commands: vec![],
            denied_commands: vec![],
            allowed_paths: vec![],
        },
        CategoryPolicy {
            category: Category::Development,
            tools: strings(&["read", "write", "list_dir", "grep", "shell"]),
            allowed_commands: strings(&[
                "git status",
                "git diff*",
                "git log*",
                "npm test*",
                "npm run lint*",
                "cargo check*",
                "cargo test*",
                "pytest*",
            ]),
            denied_commands: strings(&[
                "rm -rf *",
                "sudo *",
                "git push --force*",
                "git reset --hard*",
            ]),
            allowed_paths: strings(&["./**"]),
        },
        CategoryPolicy {
            category: Category::Infrastructure,
            tools: strings(&["read", "write", "list_dir", "grep", "shell"]),
            allowed_commands: strings(&[
                "kubectl get *",
                "kubectl describe *",
                "kubectl logs *",
                "terraform init*",
                "terraform plan*",
                "terraform validate*",
                "terraform fmt*",
                "helm list*",
                "helm template *",
                "docker ps*",
                "aws * describe-*",
                "aws * list-*",
            ]),
            denied_commands: strings(&[
                "terraform apply*",
                "terraform destroy*",
                "kubectl delete *",
                "kubectl apply *",
                "helm install *",
                "helm upgrade *",
                "helm uninstall *",
                "aws * delete-*",
                "aws * terminate-*",
                "docker rm *",
                "docker system prune*",
                "rm -rf *",
                "sudo *",
            ]),
            allowed_paths: strings(&[
                "./**/*.tf",
                "./**/*.tfvars",
                "./**/*.yaml",
                "./**/*.yml",
                "./**/*.json",
                "./**/Dockerfile",
            ]),
        },
    ]
}

pub fn default_broadening() -> Vec<BroadeningRule> {
    vec![
        BroadeningRule {
            keywords: strings(&["aws"]),
            categories: vec![Category::Infrastructure],
            grant: "@aws/*".into(),
        },
        BroadeningRule {
            keywords: strings(&["kubernetes", "k8s", "kubectl"]),
            categories: vec![Category::Infrastructure],
            grant: "@kubernetes/*".into(),
        },
        BroadeningRule {
            keywords: strings(&["scan"]),
            categories: vec![Category::Security],
            grant: "@security-scanner/*".into(),
        },
    ]
}

pub fn default_integrations() -> Vec<IntegrationRule> {
    let npx = |name: &str, keywords: &[&str], package: &str, env: &[&str]| IntegrationRule {
        name: name.to_string(),
        keywords: strings(keywords),
        command: "npx".to_string(),
        args: strings(&["-y", package]),
        env: env
            .iter()
            .map(|k| (k.to_string(), format!("${{{k}}}")))
            .collect(),
    };
    vec![
        npx(
            "github",
            &["github"],
            "@modelcontextprotocol/server-github",
            &["GITHUB_PERSONAL_ACCESS_TOKEN"],
        ),
        npx(
            "gitlab",
            &["gitlab"],
            "@modelcontextprotocol/server-gitlab",
            &["GITLAB_PERSONAL_ACCESS_TOKEN"],
        ),
        npx("aws", &["aws"], "@aws/mcp-server", &[]),
        npx(
            "kubernetes",
            &["kubernetes", "k8s", "kubectl"],
            "@kubernetes/mcp-server",
            &[],
        ),
        npx(
            "postgres",
            &["postgres"],
            "@modelcontextprotocol/server-postgres",
            &["POSTGRES_CONNECTION_STRING"],
        ),
        npx(
            "slack",
            &["slack"],
            "@modelcontextprotocol/server-slack",
            &["SLACK_BOT_TOKEN"],
        ),
    ]
}

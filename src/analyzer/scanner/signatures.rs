//! Framework signatures
//!
//! Static knowledge of what each supported framework leaves behind in a
//! project tree: marker files, package names per ecosystem, environment
//! variable prefixes and build-file content markers.

/// Package ecosystem a manifest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Node,
    Python,
    Ruby,
    Php,
    Rust,
    Jvm,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameworkSignature {
    /// Canonical framework key used across the catalog
    pub key: &'static str,
    pub ecosystem: Ecosystem,
    /// Marker paths, matched against the path relative to the project root
    pub files: &'static [&'static str],
    /// Package names declared in the ecosystem's manifest
    pub packages: &'static [&'static str],
    /// Environment variable prefixes conventionally owned by the framework
    pub env_prefixes: &'static [&'static str],
    /// `(file name, marker)` pairs for build files that are not parsed
    pub content_markers: &'static [(&'static str, &'static str)],
}

const BUILTIN: &[FrameworkSignature] = &[
    FrameworkSignature {
        key: "nextjs",
        ecosystem: Ecosystem::Node,
        files: &["next.config.js", "next.config.mjs", "next.config.ts"],
        packages: &["next"],
        env_prefixes: &["NEXT_PUBLIC_", "NEXTAUTH_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "react",
        ecosystem: Ecosystem::Node,
        files: &[],
        packages: &["react", "react-dom"],
        env_prefixes: &["REACT_APP_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "vue",
        ecosystem: Ecosystem::Node,
        files: &["vue.config.js"],
        packages: &["vue"],
        env_prefixes: &["VUE_APP_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "nuxt",
        ecosystem: Ecosystem::Node,
        files: &["nuxt.config.ts", "nuxt.config.js"],
        packages: &["nuxt"],
        env_prefixes: &["NUXT_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "sveltekit",
        ecosystem: Ecosystem::Node,
        files: &["svelte.config.js"],
        packages: &["@sveltejs/kit"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "express",
        ecosystem: Ecosystem::Node,
        files: &[],
        packages: &["express"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "fastify",
        ecosystem: Ecosystem::Node,
        files: &[],
        packages: &["fastify"],
        env_prefixes: &["FASTIFY_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "nestjs",
        ecosystem: Ecosystem::Node,
        files: &["nest-cli.json"],
        packages: &["@nestjs/core"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "django",
        ecosystem: Ecosystem::Python,
        files: &["manage.py"],
        packages: &["django"],
        env_prefixes: &["DJANGO_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "flask",
        ecosystem: Ecosystem::Python,
        files: &[],
        packages: &["flask"],
        env_prefixes: &["FLASK_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "fastapi",
        ecosystem: Ecosystem::Python,
        files: &[],
        packages: &["fastapi"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "rails",
        ecosystem: Ecosystem::Ruby,
        files: &["config/routes.rb", "bin/rails"],
        packages: &["rails"],
        env_prefixes: &["RAILS_"],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "laravel",
        ecosystem: Ecosystem::Php,
        files: &["artisan"],
        packages: &["laravel/framework"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "spring-boot",
        ecosystem: Ecosystem::Jvm,
        files: &[],
        packages: &[],
        env_prefixes: &["SPRING_"],
        content_markers: &[
            ("pom.xml", "org.springframework.boot"),
            ("build.gradle", "org.springframework.boot"),
            ("build.gradle.kts", "org.springframework.boot"),
        ],
    },
    FrameworkSignature {
        key: "axum",
        ecosystem: Ecosystem::Rust,
        files: &[],
        packages: &["axum"],
        env_prefixes: &[],
        content_markers: &[],
    },
    FrameworkSignature {
        key: "actix-web",
        ecosystem: Ecosystem::Rust,
        files: &[],
        packages: &["actix-web"],
        env_prefixes: &[],
        content_markers: &[],
    },
];

/// Signature table consulted by the file scanner
#[derive(Debug, Clone)]
pub struct FrameworkSignatures {
    signatures: Vec<FrameworkSignature>,
}

impl Default for FrameworkSignatures {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FrameworkSignatures {
    pub fn builtin() -> Self {
        Self {
            signatures: BUILTIN.to_vec(),
        }
    }

    pub fn new(signatures: Vec<FrameworkSignature>) -> Self {
        Self { signatures }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameworkSignature> {
        self.signatures.iter()
    }

    pub fn for_ecosystem(&self, ecosystem: Ecosystem) -> impl Iterator<Item = &FrameworkSignature> {
        self.signatures
            .iter()
            .filter(move |s| s.ecosystem == ecosystem)
    }

    /// Every file name the scanner has to look at
    pub fn content_files(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.signatures
            .iter()
            .flat_map(|s| s.content_markers.iter().map(|(file, _)| *file))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.signatures.iter().map(|s| s.key).collect()
    }
}

/// True if `needle` occurs in `haystack` delimited by package-name separators.
///
/// `django-rest-framework` contains `django`; `nextra` does not contain `next`.
pub fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_sep = |c: char| matches!(c, '/' | '-' | '_' | '@' | '.' | ':');
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(is_sep);
        let after_ok = haystack[end..].chars().next().is_none_or(is_sep);
        before_ok && after_ok
    })
}

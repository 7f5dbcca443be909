/// End to end runs of `weaver::generate` from configuration text to C++
/// source, with hand-built snapshots standing in for libclang.
#[cfg(test)]
mod pipeline_tests {
    use weaver::{config::MainConfig, gen_unit::MAIN_FILE, generate};
    use weaver_ast::{
        builder::TuBuilder,
        errors::AstError,
        nodes::{CursorData, CursorKind},
        provider::{FnProvider, ParseRequest},
        translation_unit::TranslationUnit,
    };

    use crate::utils::{class, function, namespace, HEADER};

    const CONFIG: &str = r#"
[common]
cxx_flags = ["-std=c++17"]

[[io]]
inputs = ["api.h"]
output = "out/api_binding.cc"
decl_fn_name = "BindApi"
extra_cxx_flags = ["-DAPI_EXPORT="]
"#;

    fn config() -> anyhow::Result<MainConfig> {
        Ok(MainConfig::load_with(CONFIG, |common| common.normalize_with(&[]))?)
    }

    /// namespace api { class Point {}; double norm(Point); }
    /// template <class T> struct Box {};  void take(Box<int>);
    fn api(b: &mut TuBuilder, request: &ParseRequest) {
        b.source(HEADER, "namespace api {}\ntemplate <class T> struct Box {};\n");
        let root = b.root();
        let ns = namespace(b, root, "api", 1);
        class(b, ns, "Point", 1);
        function(b, ns, "norm", &["double"], 1);

        let template = b.add(
            root,
            CursorData::new(CursorKind::ClassTemplate, "Box")
                .definition()
                .at(HEADER, 2),
        );
        let instance_data = CursorData::new(CursorKind::StructDecl, "Box")
            .display_name("Box<int>")
            .specializes(template);
        let instance = if request.source.contains("extern template struct Box<int>;") {
            b.add(root, instance_data.at(MAIN_FILE, 2))
        } else {
            b.add_detached(instance_data)
        };
        let box_int = b.record("Box<int>", instance);
        b.set_type(instance, box_int);
        let void = b.builtin("void");
        let take = b.add(
            root,
            CursorData::new(CursorKind::FunctionDecl, "take")
                .display_name("take(Box<int>)")
                .returns(void)
                .at(HEADER, 3),
        );
        let param = b.add(
            take,
            CursorData::new(CursorKind::ParmDecl, "value")
                .with_type(box_int)
                .at(HEADER, 3),
        );
        b.add(
            param,
            CursorData::new(CursorKind::TemplateRef, "Box")
                .references(template)
                .at(HEADER, 3),
        );
    }

    fn snapshot(request: &ParseRequest) -> Result<TranslationUnit, AstError> {
        let mut b = TuBuilder::new(request.file_name.clone());
        api(&mut b, request);
        Ok(b.build())
    }

    #[test]
    fn test_generate_from_configuration() -> anyhow::Result<()> {
        let config = config()?;
        let io = config.io_configs[0].clone();
        assert_eq!(io.inputs, vec!["\"api.h\"".to_string()]);
        assert_eq!(io.cxx_flags(), &["-std=c++17", "-DAPI_EXPORT="]);

        let flags = io.cxx_flags().to_vec();
        let provider = FnProvider::new(move |request: &ParseRequest| {
            assert_eq!(request.flags, flags);
            assert_eq!(request.file_name, std::path::Path::new(MAIN_FILE));
            snapshot(request)
        });
        let generated = generate(Box::new(provider), io)?;

        assert_eq!(
            generated.tree.to_string(),
            "Namespace api\n  Class Point\n  Function norm(double)\nClass Box<int>\nFunction take(Box<int>)\n"
        );
        let source = &generated.source;
        assert!(source.contains("void BindApi(pybind11::module_ & m) {\n"));
        assert!(source.contains(
            "pybind11::class_<api::Point> Class_api__Point = \
             pybind11::class_<api::Point>(Namespace_api, \"Point\");"
        ));
        assert!(source.contains(
            "pybind11::class_<Box<int>> Class_Box_int_ = pybind11::class_<Box<int>>(m, \"Box_int_\");"
        ));
        assert!(source.contains("static_cast<void (*)(Box<int>)>(&take)"));
        Ok(())
    }

    #[test]
    fn test_generation_is_repeatable() -> anyhow::Result<()> {
        let io = config()?.io_configs[0].clone();
        let first = generate(Box::new(FnProvider::new(snapshot)), io.clone())?;
        let second = generate(Box::new(FnProvider::new(snapshot)), io)?;
        assert_eq!(first.source, second.source);
        assert_eq!(first.tree.to_string(), second.tree.to_string());
        Ok(())
    }

    #[test]
    fn test_parse_failure_names_the_output() -> anyhow::Result<()> {
        let io = config()?.io_configs[0].clone();
        let provider = FnProvider::new(|request: &ParseRequest| {
            Err(AstError::Diagnostics {
                path: request.file_name.clone(),
                diagnostics: vec!["api.h:1:1: error: unknown type name 'foo'".into()],
            })
        });
        let message = format!("{:#}", generate(Box::new(provider), io).unwrap_err());
        assert!(message.contains("failed to parse inputs for out/api_binding.cc"), "got: {message}");
        assert!(message.contains("unknown type name 'foo'"), "got: {message}");
        Ok(())
    }

    #[test]
    fn test_reparse_failure_is_reported() -> anyhow::Result<()> {
        let io = config()?.io_configs[0].clone();
        let provider = FnProvider::new(|request: &ParseRequest| {
            if request.source.contains("extern template") {
                return Err(AstError::ParseError {
                    path: request.file_name.clone(),
                });
            }
            snapshot(request)
        });
        let message = format!("{:#}", generate(Box::new(provider), io).unwrap_err());
        assert!(
            message.contains("synthesized template instantiations"),
            "got: {message}"
        );
        Ok(())
    }
}

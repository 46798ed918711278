//! Integration tests for the sky rendering crates.
//!
//! End-to-end checks that run whole pipelines: auto cuts feeding the RGB
//! mapper, partial re-runs, undo/redo, document round trips and the
//! geometry, color and ICC chains.

#[cfg(test)]
mod algorithms;

#[cfg(test)]
mod tests {
    use sky_cmap::{DistKind, MapperSettings};
    use sky_core::{BitDepth, ChannelOrder, PixelBuffer};
    use sky_cuts::AutoCuts;
    use sky_icc::Profile;
    use sky_ops::Filter;
    use sky_pipeline::{
        ChannelMixerParams, CropParams, CutsParams, FlipSwapParams, IccParams, Pipeline,
        PipelineDoc, PipelineError, ScaleParams, ScaleTarget, StageParams, StageStatus,
        WhiteBalanceParams,
    };
    use tempfile::tempdir;

    /// 0, 1, .., 1000 in one row.
    fn ramp_1001() -> PixelBuffer {
        PixelBuffer::mono(1001, 1, (0..=1000).map(|v| v as f32).collect()).unwrap()
    }

    fn gradient(w: usize, h: usize) -> PixelBuffer {
        let data = (0..w * h).map(|i| ((i % w) * 40 + (i / w) * 3) as f32).collect();
        PixelBuffer::mono(w, h, data).unwrap()
    }

    fn rgb_frame(w: usize, h: usize) -> PixelBuffer {
        let data = (0..w * h)
            .flat_map(|i| {
                let v = (i % 251) as f32;
                [v * 2.0, v, v * 0.5]
            })
            .collect();
        PixelBuffer::new(w, h, 3, BitDepth::U16, data).unwrap()
    }

    fn viewer(cuts: AutoCuts) -> Pipeline {
        Pipeline::with_stages(
            "viewer",
            vec![
                StageParams::Input,
                StageParams::Cuts(CutsParams { algorithm: cuts, ..Default::default() }),
                StageParams::RgbMap(MapperSettings::default()),
            ],
        )
    }

    #[test]
    fn test_minmax_gray_linear_midpoint() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.set_input(ramp_1001());
        assert!(pipe.run_all().unwrap().is_ok());

        assert_eq!(pipe.blackboard().cut_levels, Some((0.0, 1000.0)));
        let out = pipe.output().unwrap();
        assert_eq!(out.order.as_str(), "RGB");
        assert_eq!(out.depth, BitDepth::U8);
        let mid = out.pixel(500, 0).unwrap();
        assert!(mid[0] == 127.0 || mid[0] == 128.0, "midpoint mapped to {}", mid[0]);
        assert_eq!(mid[0], mid[1]);
        assert_eq!(mid[1], mid[2]);
        assert_eq!(out.pixel(0, 0).unwrap()[0], 0.0);
        assert!(out.pixel(1000, 0).unwrap()[0] >= 254.0);
    }

    #[test]
    fn test_output_is_monotonic_along_ramp() {
        let mut pipe = viewer(AutoCuts::default_for("zscale").unwrap());
        pipe.set_input(ramp_1001());
        pipe.run_all().unwrap();
        let out = pipe.output().unwrap();
        let reds: Vec<f32> = out.data.chunks_exact(3).map(|px| px[0]).collect();
        assert!(reds.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_edit_reruns_only_downstream() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.set_input(gradient(64, 48));
        pipe.run_all().unwrap();
        let cut = pipe.stage(1).unwrap().result().unwrap().clone();

        let report = pipe
            .edit(
                2,
                StageParams::RgbMap(MapperSettings {
                    color_map: "heat".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(report.from, 2);
        assert_eq!(report.ran, vec![2]);
        assert_eq!(pipe.stage(1).unwrap().result().unwrap(), &cut);
        assert!(pipe.stages().iter().all(|s| s.status() == StageStatus::Done));
    }

    #[test]
    fn test_undo_redo_restores_frames() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.set_input(ramp_1001());
        pipe.run_all().unwrap();
        let original = pipe.output().unwrap().clone();

        pipe.edit(1, StageParams::Cuts(CutsParams::manual(0.0, 500.0))).unwrap();
        let edited = pipe.output().unwrap().clone();
        assert_ne!(edited, original);
        assert!(edited.pixel(700, 0).unwrap()[0] >= 254.0);

        assert!(pipe.undo().unwrap().is_some());
        assert_eq!(pipe.output().unwrap(), &original);
        assert!(pipe.can_redo());

        assert!(pipe.redo().unwrap().is_some());
        assert_eq!(pipe.output().unwrap(), &edited);
        assert!(!pipe.can_redo());
    }

    #[test]
    fn test_bypass_is_undoable() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.append(StageParams::FlipSwap(FlipSwapParams { swap_xy: true, ..Default::default() }));
        pipe.set_input(gradient(32, 16));
        pipe.run_all().unwrap();
        assert_eq!(pipe.output().unwrap().size(), (16, 32));

        pipe.set_bypass(3, true).unwrap();
        assert_eq!(pipe.output().unwrap().size(), (32, 16));
        pipe.undo().unwrap();
        assert!(!pipe.stage(3).unwrap().bypass());
        assert_eq!(pipe.output().unwrap().size(), (16, 32));
    }

    #[test]
    fn test_failed_stage_keeps_last_valid_frame() {
        // RGB data cannot be color-mapped without a mixer in front
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.set_input(rgb_frame(20, 10));
        let report = pipe.run_all().unwrap();

        let failed = report.failed.as_ref().unwrap();
        assert_eq!((failed.index, failed.kind), (2, "rgbmap"));
        assert!(pipe.output().is_none());
        assert_eq!(pipe.last_valid_output().unwrap().channels, 3);

        pipe.insert(1, StageParams::ChannelMixer(ChannelMixerParams::default())).unwrap();
        assert!(!pipe.can_undo());
        assert!(pipe.run_all().unwrap().is_ok());
        assert_eq!(pipe.output().unwrap().channels, 3);
    }

    #[test]
    fn test_color_chain_in_viewer_order() {
        let mut pipe = Pipeline::with_stages(
            "color",
            vec![
                StageParams::Input,
                StageParams::WhiteBalance(WhiteBalanceParams::from_reference([400.0, 200.0, 100.0])),
                StageParams::ChannelMixer(ChannelMixerParams::default()),
                StageParams::Cuts(CutsParams::default()),
                StageParams::RgbMap(MapperSettings { dist: DistKind::Sqrt, ..Default::default() }),
            ],
        );
        pipe.blackboard_mut().order = ChannelOrder::new("BGRA").unwrap();
        pipe.set_input(rgb_frame(40, 30));
        assert!(pipe.run_all().unwrap().is_ok());

        let mixed = pipe.stage(2).unwrap().result().unwrap();
        assert!(mixed.is_mono());
        let out = pipe.output().unwrap();
        assert_eq!(out.order.as_str(), "BGRA");
        assert!(out.data.chunks_exact(4).all(|px| px[3] == 255.0));
        assert!(out.data.chunks_exact(4).all(|px| px[0] == px[2]));
    }

    #[test]
    fn test_geometry_chain_and_crop_offset() {
        let mut pipe = Pipeline::with_stages(
            "geometry",
            vec![
                StageParams::Input,
                StageParams::Crop(CropParams { x1: 0.25, y1: 0.25, x2: 0.75, y2: 0.75, aspect: None }),
                StageParams::Scale(ScaleParams {
                    target: ScaleTarget::Factor { x: 2.0, y: 2.0 },
                    method: Filter::Bilinear,
                }),
                StageParams::FlipSwap(FlipSwapParams { swap_xy: true, ..Default::default() }),
            ],
        );
        pipe.set_input(gradient(100, 80));
        assert!(pipe.run_all().unwrap().is_ok());

        assert_eq!(pipe.stage(1).unwrap().result().unwrap().size(), (50, 40));
        assert_eq!(pipe.blackboard().crop_offset, (25, 20));
        assert_eq!(pipe.output().unwrap().size(), (80, 100));
    }

    #[test]
    fn test_icc_stage_uses_registered_profile() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.append(StageParams::IccProf(IccParams {
            input_profile: Some("srgb".into()),
            output_profile: Some("monitor".into()),
            ..Default::default()
        }));
        pipe.profiles_mut().register_icc("monitor", Profile::srgb().to_icc().unwrap()).unwrap();
        pipe.set_input(gradient(16, 16));
        assert!(pipe.run_all().unwrap().is_ok());
        assert_eq!(pipe.blackboard().icc_profile_used.as_deref(), Some("monitor"));

        // srgb -> srgb is near identity
        let mapped = pipe.stage(2).unwrap().result().unwrap();
        let out = pipe.output().unwrap();
        for (a, b) in mapped.data.iter().zip(&out.data) {
            assert!((a - b).abs() <= 2.0);
        }
    }

    #[test]
    fn test_unknown_icc_profile_passes_through() {
        let mut pipe = viewer(AutoCuts::Minmax);
        pipe.append(StageParams::IccProf(IccParams {
            input_profile: Some("srgb".into()),
            output_profile: Some("unplugged-monitor".into()),
            ..Default::default()
        }));
        pipe.set_input(gradient(8, 8));
        assert!(pipe.run_all().unwrap().is_ok());
        assert_eq!(pipe.output().unwrap(), pipe.stage(2).unwrap().result().unwrap());
        assert_eq!(pipe.blackboard().icc_profile_used, None);
    }

    #[test]
    fn test_document_file_roundtrip_reproduces_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");

        let mut pipe = viewer(AutoCuts::default_for("histogram").unwrap());
        pipe.append(StageParams::FlipSwap(FlipSwapParams { flip_y: true, ..Default::default() }));
        pipe.set_input(gradient(48, 32));
        pipe.run_all().unwrap();
        pipe.save_file(&path).unwrap();

        let mut loaded = Pipeline::new("empty");
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.name(), "viewer");
        assert_eq!(loaded.save(), pipe.save());

        loaded.set_input(gradient(48, 32));
        loaded.run_all().unwrap();
        assert_eq!(loaded.output(), pipe.output());
    }

    #[test]
    fn test_default_viewer_document_runs() {
        let yaml = PipelineDoc::default_viewer().to_yaml().unwrap();
        let mut pipe = Pipeline::new("v");
        pipe.load_yaml(&yaml).unwrap();
        pipe.set_input(gradient(30, 20));
        let report = pipe.run_all().unwrap();
        assert!(report.is_ok(), "{:?}", report.failed);
        assert_eq!(report.ran.len(), pipe.len());
        assert_eq!(pipe.output().unwrap().order.as_str(), "RGB");
    }

    #[test]
    fn test_rejected_document_leaves_pipeline_untouched() {
        let mut pipe = viewer(AutoCuts::Minmax);
        let before = pipe.save();
        let err = pipe.load_yaml("stages:\n  - type: input\n  - type: unsharp\n").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStage(_)));
        assert_eq!(pipe.save(), before);
    }
}

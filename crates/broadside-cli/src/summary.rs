use broadside_core::catalog::Slide;
use broadside_core::pipeline::config::{PipelineConfig, StageResources};
use broadside_core::pipeline::RunReport;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            error: Style::new().red().bold(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_slide_summary(slide: &Slide) {
    let s = Styles::new();
    print_title(&s, &format!("Slide {}", slide.name()));

    println!(
        "  {:<14}{}",
        s.label.apply_to("Location"),
        s.path.apply_to(slide.path().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Metadata"),
        s.path.apply_to(slide.metadata_path().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Found"),
        s.value.apply_to(slide.discovered_scene_names().join(", "))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Rounds"),
        s.value.apply_to(slide.round_names().join(", "))
    );
    println!();

    for scene in slide.scenes() {
        println!(
            "  {}  {}",
            s.header.apply_to(scene.name()),
            s.label.apply_to(format!("{} tiles", scene.tile_count()))
        );
        for round in scene.rounds() {
            println!(
                "    {:<12}{}",
                s.label.apply_to(round.name()),
                s.value.apply_to(round.tiles().len())
            );
        }
    }
    println!();
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();
    print_title(&s, "Broadside Pipeline");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Slide"),
        s.path.apply_to(config.slide.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Runner"),
        s.method.apply_to(config.runner)
    );
    println!();

    println!("  {}", s.header.apply_to("Illumination"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Samples"),
        s.value.apply_to(config.illumination.max_samples)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Darkfield"),
        s.value.apply_to(if config.illumination.compute_darkfield { "yes" } else { "no" })
    );
    print_resources(&s, &config.illumination.resources);
    println!();

    if config.assessment.enabled {
        println!("  {}", s.header.apply_to("Assessment"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Samples"),
            s.value.apply_to(config.assessment.sample_count)
        );
        println!();
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Assessment"),
            s.disabled.apply_to("disabled")
        );
        println!();
    }

    println!("  {}", s.header.apply_to("Registration"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Channel"),
        s.value.apply_to(config.registration.align_channel)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max Shift"),
        s.value.apply_to(format!("{} px", config.registration.maximum_shift))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Parallel"),
        s.value.apply_to(config.registration.concurrency)
    );
    if let Some(n) = config.registration.n_cpus {
        println!("    {:<12}{}", s.label.apply_to("CPUs"), s.value.apply_to(n));
    }
    println!();

    println!("  {}", s.header.apply_to("Pyramid"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Format"),
        s.method.apply_to(config.pyramid.variant)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tile Size"),
        s.value.apply_to(format!("{} px", config.pyramid.tile_size))
    );
    println!();
}

fn print_resources(s: &Styles, resources: &StageResources) {
    if let Some(n) = resources.n_cpus {
        println!("    {:<12}{}", s.label.apply_to("CPUs"), s.value.apply_to(n));
    }
    if let Some(ref mem) = resources.memory_limit {
        println!("    {:<12}{}", s.label.apply_to("Memory"), s.value.apply_to(mem));
    }
}

pub fn print_run_report(report: &RunReport) {
    let s = Styles::new();
    println!();

    for scene in &report.scenes {
        println!(
            "  {}  {}",
            s.header.apply_to(scene.sequence.scene()),
            s.path.apply_to(scene.final_image.display())
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Cycles"),
            s.value.apply_to(scene.sequence.rounds().join(", "))
        );
    }

    if !report.reused.is_empty() {
        println!();
        println!(
            "  {:<14}{}",
            s.label.apply_to("Reused"),
            s.disabled.apply_to(report.reused.join(", "))
        );
    }

    for failure in &report.failures {
        println!(
            "  {} {} {}: {}",
            s.error.apply_to("failed"),
            s.label.apply_to(failure.stage),
            s.value.apply_to(&failure.key),
            failure.message
        );
    }
    println!();
}

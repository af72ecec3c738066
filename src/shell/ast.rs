use std::ffi::CString;
use std::path::{Path, PathBuf};

/// 命令树中的一个节点。叶子是简单命令，其余为控制运算符
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Command(Command),
    And(Box<CommandTree>, Box<CommandTree>),
    Or(Box<CommandTree>, Box<CommandTree>),
    Sequence(Box<CommandTree>, Box<CommandTree>),
    Pipe(Box<CommandTree>, Box<CommandTree>),
    Subshell(Box<CommandTree>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub program: String,
    pub arguments: Vec<String>,
}

impl Command {
    /// argv[0] 为程序名，后接参数。含 NUL 字节的参数无法传给 execvp
    pub fn argv(&self) -> Result<Vec<CString>, String> {
        std::iter::once(&self.program)
            .chain(&self.arguments)
            .map(|arg| CString::new(arg.as_str()).map_err(|_| arg.clone()))
            .collect()
    }
}

/// 任何节点都可以带重定向，只作用于节点自身的流一次，先于其子树执行
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTree {
    pub node: Node,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl CommandTree {
    fn new(node: Node) -> Self {
        Self {
            node,
            input: None,
            output: None,
        }
    }

    pub fn command<I, S>(program: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Node::Command(Command {
            program: program.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }))
    }

    /// 空参数列表没有可执行的内容，返回 None
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self::command(program, argv))
    }

    pub fn and(left: CommandTree, right: CommandTree) -> Self {
        Self::new(Node::And(Box::new(left), Box::new(right)))
    }

    pub fn or(left: CommandTree, right: CommandTree) -> Self {
        Self::new(Node::Or(Box::new(left), Box::new(right)))
    }

    pub fn sequence(left: CommandTree, right: CommandTree) -> Self {
        Self::new(Node::Sequence(Box::new(left), Box::new(right)))
    }

    pub fn pipe(left: CommandTree, right: CommandTree) -> Self {
        Self::new(Node::Pipe(Box::new(left), Box::new(right)))
    }

    pub fn subshell(inner: CommandTree) -> Self {
        Self::new(Node::Subshell(Box::new(inner)))
    }

    pub fn stdin_from(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn stdout_to(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_from_argv() {
        assert!(CommandTree::from_argv(Vec::new()).is_none());

        let tree = CommandTree::from_argv(vec!["ls".into(), "-l".into()]).unwrap();
        match tree.node {
            Node::Command(cmd) => {
                assert_eq!(cmd.program, "ls");
                assert_eq!(cmd.arguments, vec!["-l"]);
            }
            _ => panic!("Expected simple command"),
        }
        assert!(tree.input.is_none());
        assert!(tree.output.is_none());
    }

    #[test]
    fn test_redirects_attach_to_compound_nodes() {
        let tree = CommandTree::pipe(
            CommandTree::command("sort", ["-r"]),
            CommandTree::command("head", ["-n", "1"]),
        )
        .stdin_from("in.txt")
        .stdout_to("out.txt");

        assert!(matches!(tree.node, Node::Pipe(..)));
        assert_eq!(tree.input, Some(PathBuf::from("in.txt")));
        assert_eq!(tree.output, Some(PathBuf::from("out.txt")));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_argv() {
        let cmd = Command {
            program: "echo".into(),
            arguments: vec!["a".into(), "b c".into()],
        };
        let argv = cmd.argv().unwrap();
        assert_eq!(argv.len(), 3);
        assert_eq!(argv[0].to_str().unwrap(), "echo");
        assert_eq!(argv[2].to_str().unwrap(), "b c");

        let bad = Command {
            program: "echo".into(),
            arguments: vec!["a\0b".into()],
        };
        assert_eq!(bad.argv().unwrap_err(), "a\0b");
    }
}
